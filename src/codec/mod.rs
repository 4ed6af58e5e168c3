//! Codec module - serialization of message payloads for framed links.
//!
//! - [`MsgPackCodec`] - MessagePack using `rmp-serde` (`to_vec_named`, map form)
//!
//! In-process links move envelopes directly and never touch a codec; only the
//! framed stream transport encodes payload bytes.
//!
//! # Example
//!
//! ```
//! use content_bridge::codec::MsgPackCodec;
//! use content_bridge::message::RawMessage;
//!
//! let raw = RawMessage::new("Data::Get").with_field("val", "1");
//! let encoded = MsgPackCodec::encode(&raw).unwrap();
//! let decoded: RawMessage = MsgPackCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, raw);
//! ```

mod msgpack;

pub use msgpack::MsgPackCodec;
