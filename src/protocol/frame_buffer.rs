//! Frame buffer for accumulating partial reads.
//!
//! Implements a state machine for handling fragmented frames:
//! - `WaitingForHeader`: Need at least 9 bytes
//! - `WaitingForPayload`: Header parsed and validated, need N more bytes

use bytes::{Bytes, BytesMut};

use super::wire_format::{Header, DEFAULT_MAX_PAYLOAD_SIZE, HEADER_SIZE};
use super::Frame;
use crate::error::Result;

/// State machine for frame parsing.
#[derive(Debug, Clone)]
enum State {
    WaitingForHeader,
    WaitingForPayload { header: Header },
}

/// Buffer for accumulating incoming bytes and extracting complete frames.
pub struct FrameBuffer {
    buffer: BytesMut,
    state: State,
    max_payload_size: u32,
}

impl FrameBuffer {
    /// Create a new frame buffer with the default payload limit.
    pub fn new() -> Self {
        Self::with_max_payload(DEFAULT_MAX_PAYLOAD_SIZE)
    }

    /// Create a new frame buffer with custom max payload size.
    pub fn with_max_payload(max_payload_size: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(8 * 1024),
            state: State::WaitingForHeader,
            max_payload_size,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Partial data is kept for the next push.
    ///
    /// # Errors
    ///
    /// Returns error if a header fails validation. The stream cannot be
    /// resynchronised after that, so callers should drop the link.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    fn try_extract_one(&mut self) -> Result<Option<Frame>> {
        loop {
            match self.state {
                State::WaitingForHeader => {
                    let Some(header) = Header::decode(&self.buffer) else {
                        return Ok(None);
                    };
                    header.validate(self.max_payload_size)?;
                    let _ = self.buffer.split_to(HEADER_SIZE);

                    if header.payload_length == 0 {
                        return Ok(Some(Frame::new(header, Bytes::new())));
                    }
                    self.state = State::WaitingForPayload { header };
                }
                State::WaitingForPayload { header } => {
                    let remaining = header.payload_length as usize;
                    if self.buffer.len() < remaining {
                        return Ok(None);
                    }

                    let payload = self.buffer.split_to(remaining).freeze();
                    self.state = State::WaitingForHeader;
                    return Ok(Some(Frame::new(header, payload)));
                }
            }
        }
    }

    /// Number of buffered bytes not yet part of a complete frame.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer and reset state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::WaitingForHeader;
    }

    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match &self.state {
            State::WaitingForHeader => "WaitingForHeader",
            State::WaitingForPayload { .. } => "WaitingForPayload",
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
