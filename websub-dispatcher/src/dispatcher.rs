//! Request to handler resolution.
//!
//! The dispatcher is a pure decision engine: it reads the request context
//! and the service registry and returns a [`ResolutionOutcome`]. The only
//! state it touches is the deferral flag on the request's own context.
//!
//! # Two-phase dispatch
//!
//! Header based and strategy-less services resolve from the request line and
//! headers alone. Payload based strategies need the body, so the first call
//! returns [`ResolutionOutcome::Defer`]; the host then supplies the payload
//! with [`RequestContext::supply_payload`] and dispatches once more. A second
//! call that still has no payload is a bad request, never another `Defer`.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::outcome::ResolutionOutcome;
use crate::payload::Payload;
use crate::query::{FormQueryParser, QueryParser};
use crate::registry::{PayloadKeyResourceMap, ServiceRegistry};
use crate::types::{
    HubMode, TopicStrategy, HUB_MODE_PARAM, RESOURCE_NAME_ON_INTENT_VERIFICATION,
    RESOURCE_NAME_ON_NOTIFICATION, RESOURCE_NAME_ON_SUBSCRIPTION_DENIED,
};

const METHOD_GET: &str = "GET";
const METHOD_POST: &str = "POST";

/// Intermediate result of the topic-name resolution step.
enum Resolution {
    Resource(String),
    Defer,
}

/// Resolves WebSub subscriber requests to handler names.
#[derive(Debug, Clone, Default)]
pub struct ResourceDispatcher<Q = FormQueryParser> {
    query_parser: Q,
}

impl ResourceDispatcher {
    /// Create a dispatcher using the form-urlencoded query parser.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<Q: QueryParser> ResourceDispatcher<Q> {
    /// Create a dispatcher with a custom query parser.
    pub fn with_query_parser(query_parser: Q) -> Self {
        Self { query_parser }
    }

    /// Resolve a request to an outcome.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The request's context; marked deferred when the body is needed
    /// * `registry` - The service's dispatch configuration
    /// * `handlers` - Names of the handlers the service actually implements
    pub fn dispatch(
        &self,
        ctx: &mut RequestContext,
        registry: &ServiceRegistry,
        handlers: &HashSet<String>,
    ) -> ResolutionOutcome {
        let resource_name = match self.resolve_resource_name(ctx, registry) {
            Ok(Resolution::Resource(name)) => name,
            Ok(Resolution::Defer) => {
                debug!(strategy = %registry.strategy(), "Deferring dispatch until payload is available");
                return ResolutionOutcome::Defer;
            }
            Err(e) => {
                warn!(method = ctx.method(), error = %e, "Failed to resolve WebSub resource");
                return ResolutionOutcome::Error(e);
            }
        };

        debug!(method = ctx.method(), resource = %resource_name, "Resolved WebSub resource name");
        Self::lookup_handler(ctx, registry, handlers, resource_name)
    }

    fn resolve_resource_name(
        &self,
        ctx: &mut RequestContext,
        registry: &ServiceRegistry,
    ) -> Result<Resolution, DispatchError> {
        if ctx.method() == METHOD_POST {
            Self::resolve_notification(ctx, registry)
        } else if ctx.method() == METHOD_GET {
            self.resolve_verification(ctx).map(Resolution::Resource)
        } else {
            Err(DispatchError::method_not_allowed(ctx.method()))
        }
    }

    fn resolve_notification(
        ctx: &mut RequestContext,
        registry: &ServiceRegistry,
    ) -> Result<Resolution, DispatchError> {
        let strategy = registry.strategy();

        if strategy == TopicStrategy::None {
            return Ok(Resolution::Resource(RESOURCE_NAME_ON_NOTIFICATION.to_string()));
        }

        let topic = registry.topic_header().and_then(|name| ctx.header(name));

        if strategy == TopicStrategy::ByHeader {
            let topic = topic.unwrap_or_default();
            return registry
                .header_resource_map()
                .get(topic)
                .map(|name| Resolution::Resource(name.clone()))
                .ok_or_else(|| {
                    DispatchError::no_matching_resource(format!(
                        "resource not specified for topic : {topic}"
                    ))
                });
        }

        let topic = topic.map(str::to_string);
        let payload = match ctx.payload() {
            Some(payload) => payload,
            None if ctx.is_deferred() => {
                return Err(DispatchError::bad_request(
                    "payload not supplied after dispatch was deferred",
                ));
            }
            None => {
                ctx.mark_deferred();
                return Ok(Resolution::Defer);
            }
        };

        let resolved = match strategy {
            TopicStrategy::ByPayloadKey => {
                match_payload_key(payload, registry.payload_key_resource_map())
            }
            _ => match_header_and_payload_key(topic.as_deref(), payload, registry),
        };

        resolved
            .map(|name| Resolution::Resource(name.to_string()))
            .ok_or_else(|| {
                let basis = match strategy {
                    TopicStrategy::ByPayloadKey => "Payload Key",
                    _ => "Header and Payload Key",
                };
                DispatchError::no_matching_resource(format!(
                    "Matching resource not found for dispatching based on {basis}"
                ))
            })
    }

    fn resolve_verification(&self, ctx: &RequestContext) -> Result<String, DispatchError> {
        let params = self
            .query_parser
            .parse(ctx.query())
            .map_err(|e| DispatchError::bad_request(e.to_string()))?;

        params
            .first(HUB_MODE_PARAM)
            .and_then(HubMode::parse)
            .map(|mode| mode.resource_name().to_string())
            .ok_or_else(|| DispatchError::bad_request("unsupported or missing verification mode"))
    }

    fn lookup_handler(
        ctx: &RequestContext,
        registry: &ServiceRegistry,
        handlers: &HashSet<String>,
        resource_name: String,
    ) -> ResolutionOutcome {
        if handlers.contains(&resource_name) {
            return ResolutionOutcome::Dispatch(resource_name);
        }

        match resource_name.as_str() {
            RESOURCE_NAME_ON_INTENT_VERIFICATION => {
                let topic = registry.auto_verify_topic();
                debug!(topic, "No intent verification handler, verifying automatically");
                ResolutionOutcome::AutoVerify(topic.to_string())
            }
            RESOURCE_NAME_ON_SUBSCRIPTION_DENIED => {
                debug!("Subscription denial received with no handler");
                ResolutionOutcome::Unhandled
            }
            _ => {
                let error = DispatchError::resource_not_found(&resource_name, ctx.method());
                warn!(error = %error, "Resolved resource has no handler");
                ResolutionOutcome::Error(error)
            }
        }
    }
}

/// Scan payload keys in registration order; the first key whose payload
/// value maps to a handler wins.
fn match_payload_key<'a>(payload: &Payload, map: &'a PayloadKeyResourceMap) -> Option<&'a str> {
    map.iter().find_map(|(key, values)| {
        let value = payload.get(key)?.as_str()?;
        values.get(value).map(String::as_str)
    })
}

/// Topic-scoped payload match, then the plain header map, then the plain
/// payload-key map.
fn match_header_and_payload_key<'a>(
    topic: Option<&str>,
    payload: &Payload,
    registry: &'a ServiceRegistry,
) -> Option<&'a str> {
    let by_topic = topic
        .and_then(|t| registry.header_and_payload_key_resource_map().get(t))
        .and_then(|key_map| match_payload_key(payload, key_map));

    by_topic
        .or_else(|| {
            topic
                .and_then(|t| registry.header_resource_map().get(t))
                .map(String::as_str)
        })
        .or_else(|| match_payload_key(payload, registry.payload_key_resource_map()))
}
