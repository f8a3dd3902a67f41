//! The result of a dispatch call.

use crate::error::{DispatchError, ErrorKind};

/// What the host should do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Invoke the named handler
    Dispatch(String),
    /// No verification handler exists; accept the subscription for this topic
    AutoVerify(String),
    /// Subscription denial with no handler; answer with success, invoke nothing
    Unhandled,
    /// The body is needed; supply the payload and dispatch again
    Defer,
    /// The request cannot be dispatched
    Error(DispatchError),
}

impl ResolutionOutcome {
    /// Whether the host must run another dispatch phase.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Defer)
    }

    pub fn handler_name(&self) -> Option<&str> {
        match self {
            Self::Dispatch(name) => Some(name),
            _ => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Error(e) => Some(e.kind),
            _ => None,
        }
    }
}

impl From<DispatchError> for ResolutionOutcome {
    fn from(error: DispatchError) -> Self {
        Self::Error(error)
    }
}
