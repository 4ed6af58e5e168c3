//! Delivery context for handlers.
//!
//! A handler gets the name, mode and correlation id of the message it is
//! handling, plus `send_async` for posting follow-up messages on the same
//! channel. Responses to sync calls are not sent through the context: the
//! handler returns them and the dispatcher correlates them.

use crate::channel::ChannelHandle;
use crate::error::Result;
use crate::message::{Message, Mode};

/// Context passed to message handlers.
///
/// `HandlerContext` is `Clone` and may be moved into spawned tasks.
#[derive(Clone)]
pub struct HandlerContext {
    name: String,
    mode: Mode,
    correlation_id: u32,
    channel: Option<ChannelHandle>,
}

impl HandlerContext {
    /// Create a context that is not bound to a channel (for testing).
    pub fn new(name: impl Into<String>, mode: Mode, correlation_id: u32) -> Self {
        Self {
            name: name.into(),
            mode,
            correlation_id,
            channel: None,
        }
    }

    pub(crate) fn with_channel(
        name: impl Into<String>,
        mode: Mode,
        correlation_id: u32,
        channel: ChannelHandle,
    ) -> Self {
        Self {
            name: name.into(),
            mode,
            correlation_id,
            channel: Some(channel),
        }
    }

    /// Name of the message being handled.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether the sender is waiting for this handler's return value.
    #[inline]
    pub fn is_sync(&self) -> bool {
        self.mode == Mode::Sync
    }

    /// Correlation id of a sync delivery (0 for async).
    #[inline]
    pub fn correlation_id(&self) -> u32 {
        self.correlation_id
    }

    /// Post a message to the peer on the same channel.
    ///
    /// A detached context accepts and discards the message.
    pub fn send_async(&self, message: impl Into<Message>) -> Result<()> {
        match &self.channel {
            Some(channel) => channel.send_async(message),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("correlation_id", &self.correlation_id)
            .field("attached", &self.channel.is_some())
            .finish()
    }
}
