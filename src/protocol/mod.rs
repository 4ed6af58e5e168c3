//! Protocol module - wire format and framing for stream links.
//!
//! - 9-byte header encoding/decoding
//! - Frame buffer for accumulating partial reads
//! - Frame <-> envelope conversion

mod frame;
mod frame_buffer;
mod wire_format;

pub use frame::{build_frame, Frame};
pub use frame_buffer::FrameBuffer;
pub use wire_format::{flags, Header, ASYNC_CORRELATION_ID, DEFAULT_MAX_PAYLOAD_SIZE, HEADER_SIZE};
