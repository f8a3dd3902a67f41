//! Service configuration input.
//!
//! [`ServiceConfig`] is the deserializable form of a subscriber service's
//! dispatch settings. Loading it (from a file, an annotation processor, or
//! anything else serde can read) is the caller's concern; this module only
//! turns it into a validated [`ServiceRegistry`].

use serde::Deserialize;

use crate::error::{RegistryError, RegistryResult};
use crate::registry::{
    HeaderAndPayloadKeyResourceMap, HeaderResourceMap, PayloadKeyResourceMap, ServiceRegistry,
};
use crate::types::TopicStrategy;

/// Dispatch configuration for one subscriber service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// One of `TOPIC_ID_HEADER`, `TOPIC_ID_PAYLOAD_KEY`,
    /// `TOPIC_ID_HEADER_AND_PAYLOAD`; absent means no topic dispatching
    pub topic_identifier: Option<String>,

    /// Header carrying the topic for header based strategies
    pub topic_header: Option<String>,

    /// The topic the service subscribes to
    pub topic: Option<String>,

    /// Annotated subscription target topic, preferred for auto verification
    pub target: Option<String>,

    pub header_resource_map: HeaderResourceMap,

    pub payload_key_resource_map: PayloadKeyResourceMap,

    pub header_and_payload_key_resource_map: HeaderAndPayloadKeyResourceMap,
}

impl ServiceConfig {
    /// The strategy named by `topic_identifier`.
    pub fn strategy(&self) -> RegistryResult<TopicStrategy> {
        match self.topic_identifier.as_deref() {
            None => Ok(TopicStrategy::None),
            Some(identifier) => identifier
                .parse()
                .map_err(RegistryError::UnknownStrategy),
        }
    }

    /// Validate the configuration and build the service's registry.
    pub fn into_registry(self) -> RegistryResult<ServiceRegistry> {
        let mut builder = ServiceRegistry::builder(self.strategy()?)
            .header_resource_map(self.header_resource_map)
            .payload_key_resource_map(self.payload_key_resource_map)
            .header_and_payload_key_resource_map(self.header_and_payload_key_resource_map);

        if let Some(header) = self.topic_header {
            builder = builder.topic_header(header);
        }
        if let Some(target) = self.target {
            builder = builder.verification_target(target);
        }
        if let Some(topic) = self.topic {
            builder = builder.fallback_topic(topic);
        }

        builder.build()
    }
}
