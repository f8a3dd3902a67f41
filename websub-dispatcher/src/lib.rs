//! # websub-dispatcher
//!
//! Resource dispatch for WebSub subscriber callback endpoints.
//!
//! A subscriber service receives two kinds of requests from a hub: GET intent
//! verification challenges and POST content notifications. This crate decides
//! which of the service's handlers should process each one. It does no I/O:
//! the host hands it headers, the query string and, when asked, a parsed view
//! of the body, and gets back a [`ResolutionOutcome`].
//!
//! # Overview
//!
//! - [`ServiceRegistry`]: immutable per-service configuration (topic strategy,
//!   topic header, and the topic → handler maps), built once at startup.
//! - [`RequestContext`]: per-request state threaded through both dispatch phases.
//! - [`ResourceDispatcher`]: the decision engine.
//!
//! # Example
//!
//! ```
//! use std::collections::HashSet;
//! use websub_dispatcher::{
//!     RequestContext, ResolutionOutcome, ResourceDispatcher, Scalar, ServiceRegistry,
//!     TopicStrategy,
//! };
//!
//! let registry = ServiceRegistry::builder(TopicStrategy::ByPayloadKey)
//!     .payload_key_resource("type", "create", "onCreate")
//!     .build()
//!     .unwrap();
//! let handlers: HashSet<String> = ["onCreate".to_string()].into_iter().collect();
//! let dispatcher = ResourceDispatcher::new();
//!
//! let mut ctx = RequestContext::new("POST");
//! assert_eq!(dispatcher.dispatch(&mut ctx, &registry, &handlers), ResolutionOutcome::Defer);
//!
//! ctx.supply_payload([("type", Scalar::from("create"))].into_iter().collect());
//! assert_eq!(
//!     dispatcher.dispatch(&mut ctx, &registry, &handlers),
//!     ResolutionOutcome::Dispatch("onCreate".to_string())
//! );
//! ```

pub mod config;
pub mod context;
pub mod dispatcher;
mod error;
pub mod ordered_map;
pub mod outcome;
pub mod payload;
pub mod query;
pub mod registry;
pub mod types;

pub use config::ServiceConfig;
pub use context::RequestContext;
pub use dispatcher::ResourceDispatcher;
pub use error::*;
pub use ordered_map::OrderedMap;
pub use outcome::ResolutionOutcome;
pub use payload::{Payload, PayloadInspector, Scalar};
pub use query::{FormQueryParser, QueryParams, QueryParser};
pub use registry::{ServiceRegistry, ServiceRegistryBuilder};
pub use types::*;
