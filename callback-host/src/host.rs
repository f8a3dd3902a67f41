//! Two-phase request driver.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use websub_dispatcher::{
    DispatchError, FormQueryParser, PayloadInspector, QueryParser, RequestContext,
    ResolutionOutcome, ResourceDispatcher, ServiceRegistry,
};

use crate::json_payload::JsonPayloadInspector;
use crate::response::ResponseHint;

/// A request as received by the transport.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    /// HTTP method
    pub method: String,
    /// Request headers, in arrival order
    pub headers: Vec<(String, String)>,
    /// Raw query string without the leading `?`
    pub query: Option<String>,
    /// Raw request body
    pub body: Bytes,
}

impl InboundRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// Drives dispatch for one subscriber service.
///
/// The host owns the frozen registry and the service's handler names, and
/// can be shared across worker tasks behind an `Arc`. Each call builds its
/// own [`RequestContext`], so concurrent requests never share state.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use callback_host::{CallbackHost, InboundRequest};
/// use websub_dispatcher::{ResolutionOutcome, ServiceRegistry, TopicStrategy};
///
/// let registry = ServiceRegistry::builder(TopicStrategy::ByPayloadKey)
///     .payload_key_resource("type", "create", "onCreate")
///     .build()
///     .unwrap();
/// let host = CallbackHost::new(Arc::new(registry), ["onCreate"]);
///
/// let request = InboundRequest::new("POST").with_body(r#"{"type": "create"}"#);
/// assert_eq!(host.resolve(&request), ResolutionOutcome::Dispatch("onCreate".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct CallbackHost {
    registry: Arc<ServiceRegistry>,
    handlers: Arc<HashSet<String>>,
    dispatcher: ResourceDispatcher,
}

impl CallbackHost {
    /// Create a host for a service.
    ///
    /// # Arguments
    ///
    /// * `registry` - The service's frozen dispatch configuration
    /// * `handlers` - Names of the handlers the service implements
    pub fn new<I, S>(registry: Arc<ServiceRegistry>, handlers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            registry,
            handlers: Arc::new(handlers.into_iter().map(Into::into).collect()),
            dispatcher: ResourceDispatcher::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    pub fn handlers(&self) -> &HashSet<String> {
        &self.handlers
    }

    /// Resolve a request, parsing its body as JSON if the strategy needs it.
    pub fn resolve(&self, request: &InboundRequest) -> ResolutionOutcome {
        let inspector = JsonPayloadInspector::new(request.body.clone());
        self.resolve_with(request, &inspector)
    }

    /// Resolve a request with a caller-provided payload inspector.
    ///
    /// The inspector is only consulted when the first dispatch phase defers.
    pub fn resolve_with<P: PayloadInspector>(
        &self,
        request: &InboundRequest,
        inspector: &P,
    ) -> ResolutionOutcome {
        let mut ctx = RequestContext::new(request.method.as_str())
            .with_headers(request.headers.iter().cloned());
        if let Some(query) = &request.query {
            ctx = ctx.with_query(query.as_str());
        }

        let outcome = self
            .dispatcher
            .dispatch(&mut ctx, &self.registry, &self.handlers);
        if outcome.is_terminal() {
            return outcome;
        }

        match inspector.payload() {
            Ok(payload) => ctx.supply_payload(payload.clone()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to materialize notification payload");
                return ResolutionOutcome::Error(DispatchError::bad_request(e.to_string()));
            }
        }

        self.dispatcher
            .dispatch(&mut ctx, &self.registry, &self.handlers)
    }

    /// Resolve a request and build the response the transport should send.
    pub fn respond(&self, request: &InboundRequest) -> ResponseHint {
        let outcome = self.resolve(request);
        // A malformed query already produced a BadRequest outcome
        let query = FormQueryParser
            .parse(request.query.as_deref())
            .unwrap_or_default();
        ResponseHint::from_outcome(&outcome, &query)
    }
}
