//! Message vocabulary, payloads and envelopes.
//!
//! | Name | Direction | Payload | Mode |
//! |------|-----------|---------|------|
//! | `ChannelInit::Hello` | host → content | `{}` | async |
//! | `ChannelInit::Ready` | content → host | `{}` | async, once |
//! | `Viewport::SetDisplayPort` | host → content | `{x, y, width, height}` | async |
//! | `Data::Get` | content → host | `{val}` | sync |
//! | `Data::Answer` | host → content | `{id, val}` | async / reply |

mod envelope;
mod kinds;
mod raw;
mod value;

pub use envelope::{Direction, Envelope, Mode, Side};
pub use kinds::{DataAnswer, DataRequest, DisplayPort, Message};
pub use raw::RawMessage;
pub use value::{fields_from_json, fields_to_json, Fields, Value};

/// Wire names of the known messages.
pub mod names {
    pub const HELLO: &str = "ChannelInit::Hello";
    pub const READY: &str = "ChannelInit::Ready";
    pub const SET_DISPLAY_PORT: &str = "Viewport::SetDisplayPort";
    pub const DATA_GET: &str = "Data::Get";
    pub const DATA_ANSWER: &str = "Data::Answer";
}
