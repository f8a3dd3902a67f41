//! JSON body inspection.

use std::sync::OnceLock;

use bytes::Bytes;
use serde_json::error::Category;
use serde_json::Value;
use websub_dispatcher::{OrderedMap, Payload, PayloadError, PayloadInspector, Scalar};

/// Lazily parses a JSON request body into a shallow [`Payload`].
///
/// Only top-level scalar members are kept; nested arrays and objects are
/// skipped. The body is parsed on the first call to
/// [`payload`](PayloadInspector::payload) and the result, success or
/// failure, is cached for every later call.
#[derive(Debug)]
pub struct JsonPayloadInspector {
    body: Bytes,
    parsed: OnceLock<Result<Payload, PayloadError>>,
}

impl JsonPayloadInspector {
    pub fn new(body: Bytes) -> Self {
        Self {
            body,
            parsed: OnceLock::new(),
        }
    }

    /// Whether the body has been parsed yet.
    pub fn is_parsed(&self) -> bool {
        self.parsed.get().is_some()
    }

    fn parse(body: &[u8]) -> Result<Payload, PayloadError> {
        let members: OrderedMap<Value> = serde_json::from_slice(body).map_err(|e| {
            // A well-formed document of the wrong shape reports as a data error
            match e.classify() {
                Category::Data => PayloadError::NotAnObject,
                _ => PayloadError::Decode(e.to_string()),
            }
        })?;

        Ok(members
            .iter()
            .filter_map(|(key, value)| to_scalar(value).map(|scalar| (key, scalar)))
            .collect())
    }
}

impl PayloadInspector for JsonPayloadInspector {
    fn payload(&self) -> Result<&Payload, PayloadError> {
        self.parsed
            .get_or_init(|| {
                let parsed = Self::parse(&self.body);
                tracing::debug!(
                    body_len = self.body.len(),
                    ok = parsed.is_ok(),
                    "Materialized notification payload"
                );
                parsed
            })
            .as_ref()
            .map_err(Clone::clone)
    }
}

fn to_scalar(value: &Value) -> Option<Scalar> {
    match value {
        Value::String(s) => Some(Scalar::String(s.clone())),
        Value::Number(n) => n.as_f64().map(Scalar::Number),
        Value::Bool(b) => Some(Scalar::Bool(*b)),
        Value::Null => Some(Scalar::Null),
        Value::Array(_) | Value::Object(_) => None,
    }
}
