//! Content side of the bridge.
//!
//! - [`ContentScript`] - handlers, subscriptions and readiness for one document
//! - [`Document`] - the display port and title the script drives
//! - [`ContentEventBridge`] - content events to host round trips

mod bridge;
mod document;
mod script;

pub use bridge::{AnswerSlot, ContentEvent, ContentEventBridge, TITLE_CHANGE_REQUEST};
pub use document::Document;
pub use script::{ContentScript, WindowWatcher};
