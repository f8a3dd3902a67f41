//! Shallow view of a notification body.

use std::fmt;

use crate::error::PayloadError;
use crate::ordered_map::OrderedMap;

/// A top-level scalar member of the request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl Scalar {
    /// The value as a string slice, only for string scalars.
    ///
    /// Topic matching compares strings exactly and never coerces numbers or
    /// booleans.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
        }
    }
}

/// Top-level scalar members of a request body, in document order.
pub type Payload = OrderedMap<Scalar>;

/// Materializes the request body on demand.
///
/// Implementations parse at most once and hand out the cached result on
/// every later call.
pub trait PayloadInspector {
    fn payload(&self) -> Result<&Payload, PayloadError>;
}
