//! Envelopes: how messages are wrapped for delivery.

use super::raw::RawMessage;

/// Which end of the channel a participant sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The embedding application.
    Host,
    /// The script running inside the embedded document.
    Content,
}

impl Side {
    /// The opposite end.
    pub fn peer(self) -> Side {
        match self {
            Side::Host => Side::Content,
            Side::Content => Side::Host,
        }
    }
}

/// Delivery mode of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Fire-and-forget.
    Async,
    /// The sender is suspended until a correlated reply arrives.
    Sync,
}

/// Direction of a message relative to the channel that observes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// A unit of traffic on a link.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Asynchronous message, no reply expected.
    Post(RawMessage),
    /// Synchronous request; the peer must answer with a [`Envelope::Reply`]
    /// carrying the same id.
    Call { id: u32, message: RawMessage },
    /// Completion of a sync call. `None` means "no responder".
    Reply { id: u32, message: Option<RawMessage> },
}

impl Envelope {
    /// Delivery mode of the carried message.
    pub fn mode(&self) -> Mode {
        match self {
            Envelope::Call { .. } => Mode::Sync,
            _ => Mode::Async,
        }
    }

    /// Correlation id (0 for posts).
    pub fn correlation_id(&self) -> u32 {
        match self {
            Envelope::Post(_) => 0,
            Envelope::Call { id, .. } | Envelope::Reply { id, .. } => *id,
        }
    }

    /// Name of the carried message, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Envelope::Post(message) | Envelope::Call { message, .. } => Some(&message.name),
            Envelope::Reply { message, .. } => message.as_ref().map(|m| m.name.as_str()),
        }
    }
}
