//! Frames: a header plus the encoded payload of one envelope.
//!
//! # Example
//!
//! ```
//! use content_bridge::message::{Envelope, RawMessage, Side};
//! use content_bridge::protocol::Frame;
//!
//! let envelope = Envelope::Post(RawMessage::new("ChannelInit::Ready"));
//! let frame = Frame::from_envelope(&envelope, Side::Content).unwrap();
//! assert_eq!(frame.into_envelope().unwrap(), envelope);
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::wire_format::{flags, Header, ASYNC_CORRELATION_ID, HEADER_SIZE};
use crate::codec::MsgPackCodec;
use crate::error::{BridgeError, Result};
use crate::message::{Envelope, RawMessage, Side};

/// A complete protocol frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Decoded header.
    pub header: Header,
    /// Payload bytes (zero-copy via `bytes::Bytes`).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame from header and payload.
    pub fn new(header: Header, payload: Bytes) -> Self {
        Self { header, payload }
    }

    /// Encode an envelope sent by `sender`.
    pub fn from_envelope(envelope: &Envelope, sender: Side) -> Result<Self> {
        let mut frame_flags = match sender {
            Side::Content => flags::TO_HOST,
            Side::Host => 0,
        };

        let (correlation_id, message) = match envelope {
            Envelope::Post(message) => (ASYNC_CORRELATION_ID, Some(message)),
            Envelope::Call { id, message } => {
                frame_flags |= flags::SYNC;
                (*id, Some(message))
            }
            Envelope::Reply { id, message } => {
                frame_flags |= flags::REPLY;
                if message.is_none() {
                    frame_flags |= flags::NO_RESPONDER;
                }
                (*id, message.as_ref())
            }
        };

        let payload = match message {
            Some(message) => Bytes::from(MsgPackCodec::encode(message)?),
            None => Bytes::new(),
        };

        let header = Header::new(frame_flags, correlation_id, payload.len() as u32);
        Ok(Self::new(header, payload))
    }

    /// Decode the envelope carried by this frame.
    pub fn into_envelope(self) -> Result<Envelope> {
        let id = self.header.correlation_id;

        if self.header.is_reply() {
            let message = if self.header.is_no_responder() {
                None
            } else {
                Some(self.decode_message()?)
            };
            return Ok(Envelope::Reply { id, message });
        }

        let message = self.decode_message()?;
        if self.header.is_sync() {
            Ok(Envelope::Call { id, message })
        } else {
            Ok(Envelope::Post(message))
        }
    }

    fn decode_message(&self) -> Result<RawMessage> {
        if self.payload.is_empty() {
            return Err(BridgeError::Protocol(
                "Frame is missing its message payload".to_string(),
            ));
        }
        MsgPackCodec::decode(&self.payload)
    }

    /// Side that sent this frame.
    #[inline]
    pub fn sender(&self) -> Side {
        self.header.sender()
    }

    /// Total size of this frame (header + payload).
    #[inline]
    pub fn size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Append header and payload to an output buffer.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.reserve(self.size());
        buf.put_slice(&self.header.encode());
        buf.put_slice(&self.payload);
    }
}

/// Build a complete frame as a single byte vector.
pub fn build_frame(header: &Header, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&header.encode());
    buf.extend_from_slice(payload);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::names;

    #[test]
    fn test_post_from_content_sets_direction() {
        let envelope = Envelope::Post(RawMessage::new(names::READY));
        let frame = Frame::from_envelope(&envelope, Side::Content).unwrap();

        assert_eq!(frame.header.flags, flags::TO_HOST);
        assert_eq!(frame.header.correlation_id, 0);
        assert_eq!(frame.header.payload_length as usize, frame.payload.len());
        assert_eq!(frame.sender(), Side::Content);
    }

    #[test]
    fn test_call_frame() {
        let envelope = Envelope::Call {
            id: 9,
            message: RawMessage::new(names::DATA_GET).with_field("val", "1"),
        };
        let frame = Frame::from_envelope(&envelope, Side::Content).unwrap();

        assert!(frame.header.is_sync());
        assert_eq!(frame.header.correlation_id, 9);
        assert_eq!(frame.into_envelope().unwrap(), envelope);
    }

    #[test]
    fn test_no_responder_reply_is_header_only() {
        let envelope = Envelope::Reply { id: 4, message: None };
        let frame = Frame::from_envelope(&envelope, Side::Host).unwrap();

        assert!(frame.header.is_reply());
        assert!(frame.header.is_no_responder());
        assert_eq!(frame.size(), HEADER_SIZE);
        assert_eq!(frame.sender(), Side::Host);
        assert_eq!(frame.into_envelope().unwrap(), envelope);
    }

    #[test]
    fn test_reply_with_message() {
        let envelope = Envelope::Reply {
            id: 4,
            message: Some(
                RawMessage::new(names::DATA_ANSWER)
                    .with_field("id", "test")
                    .with_field("val", "2"),
            ),
        };
        let frame = Frame::from_envelope(&envelope, Side::Host).unwrap();

        assert!(!frame.header.is_no_responder());
        assert_eq!(frame.into_envelope().unwrap(), envelope);
    }

    #[test]
    fn test_post_without_payload_is_rejected() {
        let frame = Frame::new(Header::new(0, 0, 0), Bytes::new());
        assert!(matches!(
            frame.into_envelope(),
            Err(BridgeError::Protocol(_))
        ));
    }

    #[test]
    fn test_write_to_matches_build_frame() {
        let envelope = Envelope::Post(RawMessage::new(names::HELLO));
        let frame = Frame::from_envelope(&envelope, Side::Host).unwrap();

        let mut buf = BytesMut::new();
        frame.write_to(&mut buf);

        assert_eq!(&buf[..], &build_frame(&frame.header, &frame.payload)[..]);
    }
}
