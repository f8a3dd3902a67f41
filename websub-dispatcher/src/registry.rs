//! Per-service dispatch configuration.
//!
//! A [`ServiceRegistry`] is built once when the subscriber service starts and
//! is never mutated afterwards. Only the builder can produce one, and it
//! validates that the selected strategy has what it needs to ever match.

use crate::error::{RegistryError, RegistryResult};
use crate::ordered_map::OrderedMap;
use crate::types::TopicStrategy;

/// Topic → handler name.
pub type HeaderResourceMap = OrderedMap<String>;

/// Payload key → (payload value → handler name).
pub type PayloadKeyResourceMap = OrderedMap<OrderedMap<String>>;

/// Topic → payload key → (payload value → handler name).
pub type HeaderAndPayloadKeyResourceMap = OrderedMap<PayloadKeyResourceMap>;

/// Immutable dispatch configuration for one subscriber service.
///
/// Handler names inside the maps are not checked against the service's
/// handlers; a missing handler is a dispatch outcome, not a config error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRegistry {
    strategy: TopicStrategy,
    topic_header: Option<String>,
    header_resource_map: HeaderResourceMap,
    payload_key_resource_map: PayloadKeyResourceMap,
    header_and_payload_key_resource_map: HeaderAndPayloadKeyResourceMap,
    verification_target: Option<String>,
    fallback_topic: Option<String>,
}

impl ServiceRegistry {
    /// Start building a registry for the given strategy.
    pub fn builder(strategy: TopicStrategy) -> ServiceRegistryBuilder {
        ServiceRegistryBuilder::new(strategy)
    }

    pub fn strategy(&self) -> TopicStrategy {
        self.strategy
    }

    pub fn topic_header(&self) -> Option<&str> {
        self.topic_header.as_deref()
    }

    pub fn header_resource_map(&self) -> &HeaderResourceMap {
        &self.header_resource_map
    }

    pub fn payload_key_resource_map(&self) -> &PayloadKeyResourceMap {
        &self.payload_key_resource_map
    }

    pub fn header_and_payload_key_resource_map(&self) -> &HeaderAndPayloadKeyResourceMap {
        &self.header_and_payload_key_resource_map
    }

    /// The topic of the statically annotated subscription target, if any.
    pub fn verification_target(&self) -> Option<&str> {
        self.verification_target.as_deref()
    }

    /// The service's configured default topic.
    pub fn fallback_topic(&self) -> Option<&str> {
        self.fallback_topic.as_deref()
    }

    /// Topic to report when intent verification happens automatically.
    ///
    /// The annotated target wins over the configured topic; empty values are
    /// skipped. Returns an empty string when neither is set.
    pub fn auto_verify_topic(&self) -> &str {
        [self.verification_target(), self.fallback_topic()]
            .into_iter()
            .flatten()
            .find(|topic| !topic.is_empty())
            .unwrap_or("")
    }
}

/// Builder for [`ServiceRegistry`].
#[derive(Debug, Clone)]
pub struct ServiceRegistryBuilder {
    strategy: TopicStrategy,
    topic_header: Option<String>,
    header_resource_map: HeaderResourceMap,
    payload_key_resource_map: PayloadKeyResourceMap,
    header_and_payload_key_resource_map: HeaderAndPayloadKeyResourceMap,
    verification_target: Option<String>,
    fallback_topic: Option<String>,
}

impl ServiceRegistryBuilder {
    pub fn new(strategy: TopicStrategy) -> Self {
        Self {
            strategy,
            topic_header: None,
            header_resource_map: OrderedMap::new(),
            payload_key_resource_map: OrderedMap::new(),
            header_and_payload_key_resource_map: OrderedMap::new(),
            verification_target: None,
            fallback_topic: None,
        }
    }

    /// Name of the request header carrying the topic.
    pub fn topic_header(mut self, name: impl Into<String>) -> Self {
        self.topic_header = Some(name.into());
        self
    }

    /// Map a header topic to a handler.
    pub fn header_resource(mut self, topic: impl Into<String>, resource: impl Into<String>) -> Self {
        self.header_resource_map.insert(topic, resource.into());
        self
    }

    /// Map a payload key/value pair to a handler.
    ///
    /// Keys are scanned in the order they are first registered.
    pub fn payload_key_resource(
        mut self,
        key: &str,
        value: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        insert_payload_entry(&mut self.payload_key_resource_map, key, value, resource);
        self
    }

    /// Map a header topic plus payload key/value pair to a handler.
    pub fn header_and_payload_key_resource(
        mut self,
        topic: &str,
        key: &str,
        value: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        if !self.header_and_payload_key_resource_map.contains_key(topic) {
            self.header_and_payload_key_resource_map
                .insert(topic, OrderedMap::new());
        }
        if let Some(key_map) = self.header_and_payload_key_resource_map.get_mut(topic) {
            insert_payload_entry(key_map, key, value, resource);
        }
        self
    }

    pub fn header_resource_map(mut self, map: HeaderResourceMap) -> Self {
        self.header_resource_map = map;
        self
    }

    pub fn payload_key_resource_map(mut self, map: PayloadKeyResourceMap) -> Self {
        self.payload_key_resource_map = map;
        self
    }

    pub fn header_and_payload_key_resource_map(mut self, map: HeaderAndPayloadKeyResourceMap) -> Self {
        self.header_and_payload_key_resource_map = map;
        self
    }

    /// Topic of the statically annotated subscription target.
    pub fn verification_target(mut self, topic: impl Into<String>) -> Self {
        self.verification_target = Some(topic.into());
        self
    }

    /// The service's configured default topic.
    pub fn fallback_topic(mut self, topic: impl Into<String>) -> Self {
        self.fallback_topic = Some(topic.into());
        self
    }

    /// Validate and freeze the registry.
    pub fn build(self) -> RegistryResult<ServiceRegistry> {
        let strategy = self.strategy;

        let topic_header = self.topic_header.filter(|h| !h.trim().is_empty());
        if strategy.requires_header() && topic_header.is_none() {
            return Err(RegistryError::MissingTopicHeader(strategy.to_string()));
        }

        let empty_map = match strategy {
            TopicStrategy::ByHeader if self.header_resource_map.is_empty() => {
                Some("header_resource_map")
            }
            TopicStrategy::ByPayloadKey if self.payload_key_resource_map.is_empty() => {
                Some("payload_key_resource_map")
            }
            TopicStrategy::ByHeaderAndPayloadKey
                if self.header_and_payload_key_resource_map.is_empty() =>
            {
                Some("header_and_payload_key_resource_map")
            }
            _ => None,
        };
        if let Some(map) = empty_map {
            return Err(RegistryError::EmptyResourceMap {
                strategy: strategy.to_string(),
                map,
            });
        }

        tracing::debug!(
            strategy = %strategy,
            header_topics = self.header_resource_map.len(),
            payload_keys = self.payload_key_resource_map.len(),
            combined_topics = self.header_and_payload_key_resource_map.len(),
            "Built WebSub service registry"
        );

        Ok(ServiceRegistry {
            strategy,
            topic_header,
            header_resource_map: self.header_resource_map,
            payload_key_resource_map: self.payload_key_resource_map,
            header_and_payload_key_resource_map: self.header_and_payload_key_resource_map,
            verification_target: self.verification_target,
            fallback_topic: self.fallback_topic,
        })
    }
}

fn insert_payload_entry(
    map: &mut PayloadKeyResourceMap,
    key: &str,
    value: impl Into<String>,
    resource: impl Into<String>,
) {
    if !map.contains_key(key) {
        map.insert(key, OrderedMap::new());
    }
    if let Some(value_map) = map.get_mut(key) {
        value_map.insert(value, resource.into());
    }
}
