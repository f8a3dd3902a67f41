//! Host-side driver for WebSub subscriber callback endpoints.
//!
//! This crate sits between a transport (whatever HTTP server receives the
//! hub's requests) and the [`websub_dispatcher`] decision engine:
//!
//! 1. The transport converts a received request into an [`InboundRequest`]
//! 2. [`CallbackHost`] runs the header-only dispatch phase
//! 3. If the service dispatches on the body, the host parses it with
//!    [`JsonPayloadInspector`] and runs the second phase
//! 4. [`ResponseHint`] tells the transport which handler to invoke, or which
//!    status and body to send when no handler is involved
//!
//! The crate has no server of its own and performs no I/O.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use callback_host::{CallbackHost, InboundRequest};
//! use websub_dispatcher::ServiceConfig;
//!
//! let config: ServiceConfig = serde_json::from_str(
//!     r#"{ "topic": "http://hub.example.com/feed" }"#,
//! ).unwrap();
//! let host = CallbackHost::new(Arc::new(config.into_registry().unwrap()), ["onNotification"]);
//!
//! // No onIntentVerification handler: the challenge is answered automatically
//! let request = InboundRequest::new("GET").with_query(
//!     "hub.mode=accepted&hub.topic=http%3A%2F%2Fhub.example.com%2Ffeed&hub.challenge=1234",
//! );
//! let response = host.respond(&request);
//! assert_eq!(response.status, 200);
//! assert_eq!(response.body, "1234");
//! ```

pub mod host;
pub mod json_payload;
pub mod logging;
pub mod response;

pub use host::{CallbackHost, InboundRequest};
pub use json_payload::JsonPayloadInspector;
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
pub use response::ResponseHint;
