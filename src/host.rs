//! Host side of the bridge.
//!
//! [`HostChannel`] wraps a host [`Channel`] with readiness tracking and the
//! commands the embedder issues to content.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use content_bridge::host::HostChannel;
//! use content_bridge::message::{names, DataAnswer, Message};
//! use content_bridge::transport::memory;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> content_bridge::Result<()> {
//! let (host_link, _content_link) = memory::pair();
//! let host = HostChannel::builder()
//!     .handle(names::DATA_GET, |_msg, _ctx| {
//!         Some(Message::DataAnswer(DataAnswer::new("test", "2")))
//!     })
//!     .attach(host_link)?;
//!
//! assert!(!host.wait_ready(Duration::from_millis(10)).await);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tokio::sync::watch;

use crate::channel::{Channel, ChannelBuilder, ChannelHandle};
use crate::config::BridgeConfig;
use crate::error::Result;
use crate::handler::HandlerContext;
use crate::message::{names, DataAnswer, DisplayPort, Message, RawMessage, Side};
use crate::transport::Link;

/// Builder for a [`HostChannel`].
pub struct HostChannelBuilder {
    inner: ChannelBuilder,
}

impl HostChannelBuilder {
    /// Register a listener for `name`.
    ///
    /// `ChannelInit::Ready` is always handled by the channel itself.
    pub fn handle<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&Message, &HandlerContext) -> Option<Message> + Send + Sync + 'static,
    {
        self.inner = self.inner.handle(name, handler);
        self
    }

    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.inner = self.inner.config(config);
        self
    }

    /// Attach to the host end of a link.
    pub fn attach(self, link: Link) -> Result<HostChannel> {
        let (ready_tx, ready) = watch::channel(0usize);

        let channel = self
            .inner
            .handle(names::READY, move |_msg, _ctx| {
                ready_tx.send_modify(|count| *count += 1);
                tracing::info!(count = *ready_tx.borrow(), "Content ready");
                None
            })
            .attach(link)?;

        Ok(HostChannel { channel, ready })
    }
}

/// The host end of a channel.
pub struct HostChannel {
    channel: Channel,
    ready: watch::Receiver<usize>,
}

impl HostChannel {
    pub fn builder() -> HostChannelBuilder {
        HostChannelBuilder {
            inner: ChannelBuilder::new(Side::Host),
        }
    }

    pub fn channel(&self) -> ChannelHandle {
        self.channel.handle()
    }

    /// How many `ChannelInit::Ready` messages arrived.
    pub fn ready_count(&self) -> usize {
        *self.ready.borrow()
    }

    /// Wait until content has announced itself. Returns `false` on timeout
    /// or if the channel went away first.
    pub async fn wait_ready(&self, timeout: Duration) -> bool {
        let mut ready = self.ready.clone();
        let outcome = tokio::time::timeout(timeout, ready.wait_for(|count| *count > 0)).await;
        matches!(outcome, Ok(Ok(_)))
    }

    pub fn say_hello(&self) -> Result<()> {
        self.channel.send_async(Message::Hello)
    }

    /// Ask content to use `rect` as its display port.
    pub fn set_display_port(&self, rect: DisplayPort) -> Result<()> {
        self.channel.send_async(rect)
    }

    /// Post a `Data::Answer`.
    pub fn answer(&self, id: &str, val: &str) -> Result<()> {
        self.channel.send_async(DataAnswer::new(id, val))
    }

    /// Post a message given as a name and a flat JSON object.
    ///
    /// Known names are checked against their payload shape before sending.
    pub fn send_json(&self, name: &str, json: &str) -> Result<()> {
        let message = Message::from_raw(RawMessage::from_json(name, json)?)?;
        self.channel.send_async(message)
    }

    /// Like [`send_json`](Self::send_json) but waits for the reply.
    pub async fn call_json(&self, name: &str, json: &str) -> Result<Vec<Message>> {
        let message = Message::from_raw(RawMessage::from_json(name, json)?)?;
        self.channel.send_sync(message).await
    }

    /// Tear the channel down. Returns `false` if it already was.
    pub fn detach(&self) -> bool {
        self.channel.detach()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use crate::message::Envelope;
    use crate::transport::memory;

    #[tokio::test]
    async fn test_ready_is_counted() {
        let (host_link, content_link) = memory::pair();
        let host = HostChannel::builder().attach(host_link).unwrap();

        content_link
            .send(Envelope::Post(RawMessage::new(names::READY)))
            .unwrap();

        assert!(host.wait_ready(Duration::from_secs(1)).await);
        assert_eq!(host.ready_count(), 1);
    }

    #[tokio::test]
    async fn test_commands_reach_content() {
        let (host_link, mut content_link) = memory::pair();
        let host = HostChannel::builder().attach(host_link).unwrap();

        host.say_hello().unwrap();
        host.set_display_port(DisplayPort::new(1.0, 2.0, 3.0, 4.0)).unwrap();
        host.answer("test", "2").unwrap();
        host.send_json(names::SET_DISPLAY_PORT, r#"{"x": 0, "y": 0, "width": 10, "height": 20}"#)
            .unwrap();

        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(content_link.recv().await.unwrap().name().unwrap().to_string());
        }
        assert_eq!(
            seen,
            vec![
                names::HELLO,
                names::SET_DISPLAY_PORT,
                names::DATA_ANSWER,
                names::SET_DISPLAY_PORT
            ]
        );
    }

    #[tokio::test]
    async fn test_send_json_rejects_malformed_known_payload() {
        let (host_link, _content_link) = memory::pair();
        let host = HostChannel::builder().attach(host_link).unwrap();

        assert!(matches!(
            host.send_json(names::SET_DISPLAY_PORT, r#"{"x": "left"}"#),
            Err(BridgeError::MalformedPayload { .. })
        ));
        assert!(host.send_json("Custom::Event", r#"{"any": true}"#).is_ok());
        assert!(host.send_json("Custom::Event", "not json").is_err());
    }
}
