//! Error types for the websub-dispatcher crate.

use std::fmt;

/// Classification of a failed resolution.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum ErrorKind {
    /// Request method other than GET or POST
    MethodNotAllowed,
    /// Malformed query string, missing or unsupported `hub.mode`, or a
    /// payload that never arrived after deferral
    BadRequest,
    /// No configured mapping matches the topic or payload
    NoMatchingResource,
    /// The resolved handler name has no registered handler
    ResourceNotFound,
}

impl ErrorKind {
    /// Suggested HTTP status for the host to answer with.
    pub fn status_hint(&self) -> u16 {
        match self {
            Self::MethodNotAllowed => 405,
            Self::BadRequest => 400,
            Self::NoMatchingResource | Self::ResourceNotFound => 404,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MethodNotAllowed => "method not allowed",
            Self::BadRequest => "bad request",
            Self::NoMatchingResource => "no matching resource",
            Self::ResourceNotFound => "resource not found",
        };
        f.write_str(name)
    }
}

/// Error value carried by [`ResolutionOutcome::Error`](crate::ResolutionOutcome::Error).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} ({status_hint}): {message}")]
pub struct DispatchError {
    pub kind: ErrorKind,
    pub status_hint: u16,
    pub message: String,
}

impl DispatchError {
    /// Create an error with the kind's default status hint.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status_hint: kind.status_hint(),
            message: message.into(),
        }
    }

    pub fn method_not_allowed(method: &str) -> Self {
        Self::new(
            ErrorKind::MethodNotAllowed,
            format!("method not allowed for WebSub subscriber services: {method}"),
        )
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn no_matching_resource(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoMatchingResource, message)
    }

    pub fn resource_not_found(resource_name: &str, method: &str) -> Self {
        Self::new(
            ErrorKind::ResourceNotFound,
            format!("no handler named {resource_name} for method {method}"),
        )
    }
}

/// Errors raised while building a [`ServiceRegistry`](crate::ServiceRegistry).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The configured topic identifier is not a known strategy
    #[error("Unknown topic identifier: {0}")]
    UnknownStrategy(String),

    /// A header based strategy was configured without a header name
    #[error("Topic header name is required for strategy {0}")]
    MissingTopicHeader(String),

    /// The map the strategy dispatches on is empty
    #[error("Resource map {map} is empty for strategy {strategy}")]
    EmptyResourceMap {
        /// The strategy identifier
        strategy: String,
        /// Name of the empty map
        map: &'static str,
    },
}

/// Errors from query string parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The query string contains an invalid percent escape or invalid UTF-8
    #[error("Malformed query string: {0}")]
    Malformed(String),
}

/// Errors from payload materialization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// The body could not be decoded
    #[error("Failed to decode payload: {0}")]
    Decode(String),

    /// The body decoded to something other than a top-level object
    #[error("Payload is not an object")]
    NotAnObject,
}

/// Convenience type alias for registry construction results.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
