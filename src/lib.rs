//! # content-bridge
//!
//! Message channel between an embedding host and a script running inside an
//! embedded document.
//!
//! The host issues commands (say hello, move the display port, answer data
//! requests) and the content side reports lifecycle events back. Each side
//! owns one [`Channel`] per content instance.
//!
//! ## Architecture
//!
//! - **Dispatcher**: lifecycle state, handler routing, sync-call correlation
//! - **Handler registry**: one handler per message name
//! - **Observer manager**: weak, per-channel topic subscriptions
//! - **Content event bridge**: content events turned into host round trips
//! - **Transport**: in-memory link pair or a framed byte stream
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use content_bridge::content::{ContentScript, Document};
//! use content_bridge::host::HostChannel;
//! use content_bridge::message::DisplayPort;
//! use content_bridge::transport::memory;
//! use content_bridge::BridgeConfig;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> content_bridge::Result<()> {
//! let (host_link, content_link) = memory::pair();
//! let host = HostChannel::builder().attach(host_link)?;
//!
//! let document = Arc::new(Document::default());
//! let _script = ContentScript::attach(content_link, document.clone(), BridgeConfig::default())?;
//!
//! assert!(host.wait_ready(Duration::from_secs(1)).await);
//! host.set_display_port(DisplayPort::new(0.0, 0.0, 800.0, 600.0))?;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod codec;
pub mod config;
pub mod content;
pub mod error;
pub mod handler;
pub mod host;
pub mod message;
pub mod observer;
pub mod protocol;
pub mod transport;

pub use channel::{Channel, ChannelBuilder, ChannelHandle, ChannelState};
pub use config::{BridgeConfig, Preferences};
pub use error::{BridgeError, Result};
pub use handler::HandlerContext;
pub use message::{Message, Side};
