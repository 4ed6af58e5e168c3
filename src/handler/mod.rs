//! Handler module - per-channel message handlers.
//!
//! Provides:
//! - [`HandlerRegistry`] - maps message names to handlers
//! - [`HandlerContext`] - delivery details plus a way to post outbound messages
//!
//! # Example
//!
//! ```
//! use content_bridge::handler::HandlerRegistry;
//! use content_bridge::message::{names, DataAnswer, Message};
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register(names::DATA_GET, |_msg, _ctx| {
//!     Some(Message::DataAnswer(DataAnswer::new("test", "2")))
//! });
//! assert!(registry.contains(names::DATA_GET));
//! ```

mod context;
mod registry;

pub use context::HandlerContext;
pub use registry::{Handler, HandlerRegistry, HandlerResult};
pub(crate) use registry::run_handler;
