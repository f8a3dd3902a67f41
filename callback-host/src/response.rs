//! Mapping resolution outcomes to HTTP responses.

use websub_dispatcher::{QueryParams, ResolutionOutcome, HUB_CHALLENGE_PARAM};

const HUB_TOPIC_PARAM: &str = "hub.topic";

/// The response a host should send for an outcome that does not reach a
/// user handler, or the handler to invoke when it does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHint {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
    /// Handler to invoke, for [`ResolutionOutcome::Dispatch`]
    pub handler: Option<String>,
}

impl ResponseHint {
    fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            handler: None,
        }
    }

    /// Build the response hint for an outcome.
    ///
    /// `query` is the request's parsed query string; automatic verification
    /// echoes its `hub.challenge` back to the hub. A `hub.topic` that differs
    /// from the service's topic is refused with 404.
    pub fn from_outcome(outcome: &ResolutionOutcome, query: &QueryParams) -> Self {
        match outcome {
            ResolutionOutcome::Dispatch(handler) => Self {
                status: 200,
                body: String::new(),
                handler: Some(handler.clone()),
            },
            ResolutionOutcome::AutoVerify(topic) => {
                match query.first(HUB_TOPIC_PARAM) {
                    Some(requested) if !topic.is_empty() && requested != topic => {
                        tracing::warn!(
                            requested,
                            topic = topic.as_str(),
                            "Intent verification for unexpected topic"
                        );
                        Self::new(404, format!("intent verification denied for topic : {requested}"))
                    }
                    _ => Self::new(200, query.first(HUB_CHALLENGE_PARAM).unwrap_or_default()),
                }
            }
            ResolutionOutcome::Unhandled => Self::new(200, ""),
            ResolutionOutcome::Error(e) => Self::new(e.status_hint, e.message.clone()),
            ResolutionOutcome::Defer => {
                tracing::error!("Deferred outcome reached the response stage");
                Self::new(500, "Internal server error")
            }
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
