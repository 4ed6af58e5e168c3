//! Wire format encoding and decoding.
//!
//! Every envelope on a framed link starts with a 9-byte header:
//! ```text
//! ┌───────┬────────────────┬──────────┐
//! │ Flags │ Correlation ID │ Length   │
//! │ 1 byte│ 4 bytes        │ 4 bytes  │
//! │       │ uint32 BE      │ uint32 BE│
//! └───────┴────────────────┴──────────┘
//! ```
//!
//! All multi-byte integers are Big Endian. The payload that follows is the
//! MsgPack encoding of a [`RawMessage`](crate::message::RawMessage).

use crate::error::{BridgeError, Result};
use crate::message::Side;

/// Header size in bytes (fixed, exactly 9).
pub const HEADER_SIZE: usize = 9;

/// Default maximum payload size (16 MiB). Bridge payloads are flat maps of
/// scalars; anything near this size is a broken peer.
pub const DEFAULT_MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Correlation id carried by asynchronous posts.
pub const ASYNC_CORRELATION_ID: u32 = 0;

/// Flag constants for the protocol.
pub mod flags {
    /// Sender is the content side (1) or the host (0).
    pub const TO_HOST: u8 = 0b0000_0001;
    /// Synchronous call awaiting a reply.
    pub const SYNC: u8 = 0b0000_0010;
    /// Reply to a synchronous call.
    pub const REPLY: u8 = 0b0000_0100;
    /// Reply carrying no message: nobody handled the call.
    pub const NO_RESPONDER: u8 = 0b0000_1000;

    /// Reserved bits mask (bits 4-7).
    pub const RESERVED_MASK: u8 = 0b1111_0000;

    /// Check if a specific flag is set.
    #[inline]
    pub fn has_flag(flags: u8, flag: u8) -> bool {
        flags & flag != 0
    }
}

/// Decoded header from wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Flags byte (see `flags` module).
    pub flags: u8,
    /// Correlation identifier (0 = async post).
    pub correlation_id: u32,
    /// Payload length in bytes.
    pub payload_length: u32,
}

impl Header {
    /// Create a new header.
    pub fn new(flags: u8, correlation_id: u32, payload_length: u32) -> Self {
        Self {
            flags,
            correlation_id,
            payload_length,
        }
    }

    /// Encode header to bytes (Big Endian).
    ///
    /// # Example
    ///
    /// ```
    /// use content_bridge::protocol::{flags, Header, HEADER_SIZE};
    ///
    /// let header = Header::new(flags::TO_HOST | flags::SYNC, 42, 100);
    /// assert_eq!(header.encode().len(), HEADER_SIZE);
    /// ```
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0] = self.flags;
        buf[1..5].copy_from_slice(&self.correlation_id.to_be_bytes());
        buf[5..9].copy_from_slice(&self.payload_length.to_be_bytes());
        buf
    }

    /// Decode header from bytes (Big Endian).
    ///
    /// Returns `None` if buffer is too short.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        Some(Self {
            flags: buf[0],
            correlation_id: u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]),
            payload_length: u32::from_be_bytes([buf[5], buf[6], buf[7], buf[8]]),
        })
    }

    /// Validate the header for protocol compliance.
    ///
    /// Checks:
    /// - Payload length doesn't exceed max
    /// - Reserved flag bits are 0
    /// - Sync and reply are not both set
    /// - A no-responder reply has no payload
    /// - Posts carry correlation id 0, calls and replies a non-zero one
    pub fn validate(&self, max_payload_size: u32) -> Result<()> {
        if self.payload_length > max_payload_size {
            return Err(BridgeError::Protocol(format!(
                "Payload size {} exceeds maximum {}",
                self.payload_length, max_payload_size
            )));
        }

        if self.flags & flags::RESERVED_MASK != 0 {
            return Err(BridgeError::Protocol(
                "Reserved flag bits must be 0".to_string(),
            ));
        }

        if self.is_sync() && self.is_reply() {
            return Err(BridgeError::Protocol(
                "Frame cannot be both a call and a reply".to_string(),
            ));
        }

        if self.is_no_responder() && (!self.is_reply() || self.payload_length != 0) {
            return Err(BridgeError::Protocol(
                "No-responder flag is only valid on an empty reply".to_string(),
            ));
        }

        let correlated = self.is_sync() || self.is_reply();
        if correlated == (self.correlation_id == ASYNC_CORRELATION_ID) {
            return Err(BridgeError::Protocol(format!(
                "Correlation id {} does not match frame kind",
                self.correlation_id
            )));
        }

        Ok(())
    }

    /// Side that sent this frame.
    #[inline]
    pub fn sender(&self) -> Side {
        if flags::has_flag(self.flags, flags::TO_HOST) {
            Side::Content
        } else {
            Side::Host
        }
    }

    #[inline]
    pub fn is_sync(&self) -> bool {
        flags::has_flag(self.flags, flags::SYNC)
    }

    #[inline]
    pub fn is_reply(&self) -> bool {
        flags::has_flag(self.flags, flags::REPLY)
    }

    #[inline]
    pub fn is_no_responder(&self) -> bool {
        flags::has_flag(self.flags, flags::NO_RESPONDER)
    }
}
