//! Request-scoped dispatch state.

use crate::payload::Payload;

/// Everything the dispatcher knows about one inbound request.
///
/// Created by the host per request and threaded through both dispatch
/// phases. The dispatcher records deferral here; the host supplies the
/// payload between phases with [`supply_payload`](Self::supply_payload).
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    method: String,
    headers: Vec<(String, String)>,
    query: Option<String>,
    payload: Option<Payload>,
    deferred: bool,
}

impl RequestContext {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            headers: Vec::new(),
            query: None,
            payload: None,
            deferred: false,
        }
    }

    /// Add a request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add several request headers.
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the raw query string.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Attach an already-materialized payload.
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// First value of a header; names compare ASCII case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// Whether phase one asked for the body.
    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    /// Hand the materialized body to the context for phase two.
    pub fn supply_payload(&mut self, payload: Payload) {
        self.payload = Some(payload);
    }

    pub(crate) fn mark_deferred(&mut self) {
        self.deferred = true;
    }
}
