//! Error types for content-bridge.

use thiserror::Error;

/// Main error type for all bridge operations.
///
/// Transport and payload problems (`UnknownMessage`, `MalformedPayload`,
/// `Protocol`) are normally logged and dropped by the dispatcher.
/// `ChannelTornDown` is the one lifecycle error that always reaches the caller.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// I/O error on a framed stream link.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error (preferences and JSON payload entry points).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// Protocol error (invalid frame, wrong flags, wrong direction, etc.).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// No handler is registered for the message name.
    #[error("No handler registered for message: {0}")]
    UnknownMessage(String),

    /// A required payload field is missing or has the wrong type.
    #[error("Malformed payload for {name}: {reason}")]
    MalformedPayload {
        /// Message name.
        name: String,
        /// What was wrong with the payload.
        reason: String,
    },

    /// The channel was detached; no further traffic is accepted.
    #[error("Channel torn down")]
    ChannelTornDown,

    /// The peer end of the link went away.
    #[error("Connection closed")]
    ConnectionClosed,
}

impl BridgeError {
    /// Shorthand for building a [`BridgeError::MalformedPayload`].
    pub fn malformed(name: &str, reason: impl Into<String>) -> Self {
        BridgeError::MalformedPayload {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using BridgeError.
pub type Result<T> = std::result::Result<T, BridgeError>;
