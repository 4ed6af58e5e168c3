//! Channels: one stateful session between a host and one content instance.
//!
//! A [`Channel`] owns a [`Dispatcher`] (handlers, lifecycle state, pending
//! sync calls) and an [`ObserverManager`]. Both are populated by the
//! [`ChannelBuilder`] before the channel attaches to its [`Link`], and both
//! are destroyed together when it detaches.
//!
//! # Example
//!
//! ```
//! use content_bridge::channel::Channel;
//! use content_bridge::message::{names, Side};
//! use content_bridge::transport::memory;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> content_bridge::Result<()> {
//! let (host_link, content_link) = memory::pair();
//!
//! let host = Channel::builder(Side::Host)
//!     .handle(names::READY, |_msg, _ctx| None)
//!     .attach(host_link)?;
//! let content = Channel::builder(Side::Content).attach(content_link)?;
//!
//! content.detach();
//! assert!(content.handle().is_torn_down());
//! # drop(host);
//! # Ok(())
//! # }
//! ```

mod dispatcher;

pub use dispatcher::{ChannelState, Dispatcher};

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::handler::{HandlerContext, HandlerRegistry};
use crate::message::{Envelope, Message, Side};
use crate::observer::{Observer, ObserverManager};
use crate::transport::Link;

/// Cloneable handle for sending on a channel.
///
/// Handles stay valid after detach; every operation then fails with
/// [`BridgeError::ChannelTornDown`].
#[derive(Clone, Debug)]
pub struct ChannelHandle {
    dispatcher: Arc<Dispatcher>,
}

impl ChannelHandle {
    pub(crate) fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.dispatcher.side()
    }

    #[inline]
    pub fn state(&self) -> ChannelState {
        self.dispatcher.state()
    }

    #[inline]
    pub fn is_torn_down(&self) -> bool {
        self.dispatcher.is_torn_down()
    }

    /// See [`Dispatcher::send_async`].
    pub fn send_async(&self, message: impl Into<Message>) -> Result<()> {
        self.dispatcher.send_async(message)
    }

    /// See [`Dispatcher::send_sync`].
    pub async fn send_sync(&self, message: impl Into<Message>) -> Result<Vec<Message>> {
        self.dispatcher.send_sync(message).await
    }

    /// Register a handler, replacing any previous one for `name`.
    pub fn register<F>(&self, name: &str, handler: F) -> Result<bool>
    where
        F: Fn(&Message, &HandlerContext) -> Option<Message> + Send + Sync + 'static,
    {
        self.dispatcher.register(name, handler)
    }

    pub fn unregister(&self, name: &str) -> Result<bool> {
        self.dispatcher.unregister(name)
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.dispatcher.has_handler(name)
    }
}

/// Builder for a [`Channel`].
pub struct ChannelBuilder {
    side: Side,
    registry: HandlerRegistry,
    observers: ObserverManager,
    config: BridgeConfig,
}

impl ChannelBuilder {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            registry: HandlerRegistry::new(),
            observers: ObserverManager::new(),
            config: BridgeConfig::default(),
        }
    }

    /// Register a handler for `name`.
    pub fn handle<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&Message, &HandlerContext) -> Option<Message> + Send + Sync + 'static,
    {
        self.registry.register(name, handler);
        self
    }

    /// Subscribe `holder` to `topic` without keeping it alive.
    pub fn observe<O>(mut self, topic: &str, holder: &Arc<O>, persistent: bool) -> Self
    where
        O: Observer + 'static,
    {
        self.observers.subscribe(topic, holder, persistent);
        self
    }

    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach to a link and start delivering inbound traffic.
    ///
    /// The content side announces itself with `ChannelInit::Ready`; this
    /// happens once per channel. Must be called inside a Tokio runtime.
    pub fn attach(self, link: Link) -> Result<Channel> {
        let (outbound, inbound) = link.into_parts();
        let dispatcher = Arc::new(Dispatcher::new(
            self.side,
            self.registry,
            outbound,
            self.config.sync_timeout,
        ));

        let reader = tokio::spawn(read_loop(dispatcher.clone(), inbound));

        if dispatcher.mark_ready() && self.side == Side::Content {
            dispatcher.send_async(Message::Ready)?;
        }

        Ok(Channel {
            handle: ChannelHandle::new(dispatcher),
            observers: Mutex::new(self.observers),
            reader,
        })
    }
}

/// An attached channel.
///
/// Dropping the channel detaches it.
pub struct Channel {
    handle: ChannelHandle,
    observers: Mutex<ObserverManager>,
    reader: JoinHandle<()>,
}

impl Channel {
    pub fn builder(side: Side) -> ChannelBuilder {
        ChannelBuilder::new(side)
    }

    /// A cloneable sending handle.
    pub fn handle(&self) -> ChannelHandle {
        self.handle.clone()
    }

    pub fn side(&self) -> Side {
        self.handle.side()
    }

    pub fn state(&self) -> ChannelState {
        self.handle.state()
    }

    pub fn send_async(&self, message: impl Into<Message>) -> Result<()> {
        self.handle.send_async(message)
    }

    pub async fn send_sync(&self, message: impl Into<Message>) -> Result<Vec<Message>> {
        self.handle.send_sync(message).await
    }

    /// Deliver an envelope directly, bypassing the link.
    pub fn receive(&self, envelope: Envelope) -> Result<()> {
        self.handle.dispatcher.receive(envelope)
    }

    pub fn register<F>(&self, name: &str, handler: F) -> Result<bool>
    where
        F: Fn(&Message, &HandlerContext) -> Option<Message> + Send + Sync + 'static,
    {
        self.handle.register(name, handler)
    }

    pub fn unregister(&self, name: &str) -> Result<bool> {
        self.handle.unregister(name)
    }

    /// Notify the live subscribers of `topic`. Returns how many ran.
    ///
    /// Observers run after the subscription table is unlocked, so they may
    /// use the channel.
    pub fn notify(&self, topic: &str, subject: &str) -> Result<usize> {
        if self.handle.is_torn_down() {
            return Err(BridgeError::ChannelTornDown);
        }

        let due = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .collect(topic);

        for observer in &due {
            observer.observe(topic, subject);
        }
        tracing::debug!(topic, subject, observers = due.len(), "Notified observers");
        Ok(due.len())
    }

    /// Stored subscriptions for `topic`.
    pub fn subscription_count(&self, topic: &str) -> usize {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .subscription_count(topic)
    }

    /// Tear the channel down. Returns `false` if it already was.
    pub fn detach(&self) -> bool {
        let torn_down = self.handle.dispatcher.teardown();
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.reader.abort();
        torn_down
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Tears the dispatcher down when the read loop exits, however it exits.
struct TeardownOnExit(Arc<Dispatcher>);

impl Drop for TeardownOnExit {
    fn drop(&mut self) {
        if self.0.teardown() {
            tracing::debug!(side = ?self.0.side(), "Reader stopped");
        }
    }
}

/// Feed inbound envelopes to the dispatcher until the peer hangs up.
async fn read_loop(dispatcher: Arc<Dispatcher>, mut inbound: mpsc::UnboundedReceiver<Envelope>) {
    let _teardown = TeardownOnExit(dispatcher.clone());
    while let Some(envelope) = inbound.recv().await {
        match dispatcher.receive(envelope) {
            Ok(()) => {}
            Err(BridgeError::ChannelTornDown) | Err(BridgeError::ConnectionClosed) => break,
            Err(e) => tracing::warn!(side = ?dispatcher.side(), error = %e, "Inbound delivery failed"),
        }
    }
}
