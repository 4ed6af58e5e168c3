//! Per-channel dispatcher: lifecycle state, handler routing and sync-call
//! correlation.
//!
//! ```text
//!   Uninitialized ──attach──► Ready ──teardown──► TornDown
//!                              │ ▲
//!                              └─┘ send / receive
//! ```
//!
//! Sync calls take a fresh correlation id and park a single-slot
//! [`oneshot`] receiver in the pending table. The slot is completed exactly
//! once: by the matching reply, by teardown, or removed on timeout.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use super::ChannelHandle;
use crate::error::{BridgeError, Result};
use crate::handler::{run_handler, HandlerContext, HandlerRegistry};
use crate::message::{Direction, Envelope, Message, Mode, RawMessage, Side};

/// Lifecycle state of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChannelState {
    Uninitialized = 0,
    Ready = 1,
    /// Terminal.
    TornDown = 2,
}

impl ChannelState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ChannelState::Uninitialized,
            1 => ChannelState::Ready,
            _ => ChannelState::TornDown,
        }
    }
}

type ReplySlot = oneshot::Sender<Option<RawMessage>>;

/// Routes traffic for one channel.
pub struct Dispatcher {
    side: Side,
    state: AtomicU8,
    registry: RwLock<HandlerRegistry>,
    outbound: Mutex<Option<mpsc::UnboundedSender<Envelope>>>,
    pending: Mutex<HashMap<u32, ReplySlot>>,
    next_call_id: AtomicU32,
    sync_timeout: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Dispatcher {
    pub(crate) fn new(
        side: Side,
        registry: HandlerRegistry,
        outbound: mpsc::UnboundedSender<Envelope>,
        sync_timeout: Duration,
    ) -> Self {
        Self {
            side,
            state: AtomicU8::new(ChannelState::Uninitialized as u8),
            registry: RwLock::new(registry),
            outbound: Mutex::new(Some(outbound)),
            pending: Mutex::new(HashMap::new()),
            next_call_id: AtomicU32::new(1),
            sync_timeout,
        }
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    pub fn state(&self) -> ChannelState {
        ChannelState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_torn_down(&self) -> bool {
        self.state() == ChannelState::TornDown
    }

    /// Sync calls still waiting for a reply.
    pub fn pending_calls(&self) -> usize {
        lock(&self.pending).len()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_torn_down() {
            Err(BridgeError::ChannelTornDown)
        } else {
            Ok(())
        }
    }

    /// Move from `Uninitialized` to `Ready`. Returns `false` if the channel
    /// was already past that point.
    pub(crate) fn mark_ready(&self) -> bool {
        let moved = self
            .state
            .compare_exchange(
                ChannelState::Uninitialized as u8,
                ChannelState::Ready as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if moved {
            tracing::debug!(side = ?self.side, "Channel ready");
        }
        moved
    }

    /// Tear the channel down. Returns `false` if it already was.
    ///
    /// Every pending sync call resolves to "no responder", every handler is
    /// dropped and the outbound queue is closed.
    pub fn teardown(&self) -> bool {
        let previous = self
            .state
            .swap(ChannelState::TornDown as u8, Ordering::AcqRel);
        if previous == ChannelState::TornDown as u8 {
            return false;
        }

        // Outbound closes before pending drains.
        lock(&self.outbound).take();

        let abandoned: Vec<ReplySlot> = lock(&self.pending).drain().map(|(_, slot)| slot).collect();
        let abandoned_calls = abandoned.len();
        for slot in abandoned {
            let _ = slot.send(None);
        }

        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        tracing::info!(side = ?self.side, abandoned_calls, "Channel torn down");
        true
    }

    /// Register a handler. Returns `true` if one was replaced.
    pub fn register<F>(&self, name: &str, handler: F) -> Result<bool>
    where
        F: Fn(&Message, &HandlerContext) -> Option<Message> + Send + Sync + 'static,
    {
        self.ensure_open()?;
        Ok(self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(name, handler))
    }

    /// Remove a handler. Returns `true` if one was registered.
    pub fn unregister(&self, name: &str) -> Result<bool> {
        self.ensure_open()?;
        Ok(self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .unregister(name))
    }

    /// Whether a handler is registered for `name`.
    pub fn has_handler(&self, name: &str) -> bool {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }

    fn post(&self, envelope: Envelope) -> Result<()> {
        let outbound = lock(&self.outbound);
        let Some(tx) = outbound.as_ref() else {
            return Err(BridgeError::ChannelTornDown);
        };
        self.trace(Direction::Outbound, &envelope);
        tx.send(envelope).map_err(|_| BridgeError::ConnectionClosed)
    }

    fn trace(&self, direction: Direction, envelope: &Envelope) {
        tracing::trace!(
            side = ?self.side,
            ?direction,
            mode = ?envelope.mode(),
            id = envelope.correlation_id(),
            name = envelope.name().unwrap_or("<none>"),
            "Envelope"
        );
    }

    /// Post a message without waiting for any response.
    ///
    /// A peer that has already hung up is logged and the message dropped.
    pub fn send_async(&self, message: impl Into<Message>) -> Result<()> {
        self.ensure_open()?;
        let message = message.into();

        match self.post(Envelope::Post(message.to_raw())) {
            Err(BridgeError::ConnectionClosed) => {
                tracing::warn!(name = message.name(), "Peer gone, dropping message");
                Ok(())
            }
            other => other,
        }
    }

    fn next_call_id(&self) -> u32 {
        loop {
            let id = self.next_call_id.fetch_add(1, Ordering::Relaxed);
            if id != 0 {
                return id;
            }
        }
    }

    /// Send a message and wait for its correlated response.
    ///
    /// Resolves to zero or one message. Zero means "no responder": nobody
    /// handled the call, the reply was malformed, the link closed, the
    /// channel was torn down while waiting, or the sync timeout elapsed.
    /// Only a call started after teardown fails.
    pub async fn send_sync(&self, message: impl Into<Message>) -> Result<Vec<Message>> {
        self.ensure_open()?;
        let message = message.into();
        let name = message.name().to_string();

        let id = self.next_call_id();
        let (slot, reply) = oneshot::channel();
        lock(&self.pending).insert(id, slot);

        if let Err(e) = self.post(Envelope::Call {
            id,
            message: message.to_raw(),
        }) {
            lock(&self.pending).remove(&id);
            return match e {
                BridgeError::ConnectionClosed => {
                    tracing::warn!(name = %name, "Peer gone, sync call has no responder");
                    Ok(Vec::new())
                }
                BridgeError::ChannelTornDown => {
                    tracing::debug!(name = %name, id, "Torn down while sending, no responder");
                    Ok(Vec::new())
                }
                other => Err(other),
            };
        }

        match tokio::time::timeout(self.sync_timeout, reply).await {
            Ok(Ok(Some(raw))) => match Message::from_raw(raw) {
                Ok(response) => Ok(vec![response]),
                Err(e) => {
                    tracing::warn!(name = %name, error = %e, "Dropping malformed reply");
                    Ok(Vec::new())
                }
            },
            Ok(Ok(None)) | Ok(Err(_)) => {
                tracing::debug!(name = %name, id, "Sync call has no responder");
                Ok(Vec::new())
            }
            Err(_) => {
                lock(&self.pending).remove(&id);
                tracing::warn!(
                    name = %name,
                    id,
                    timeout_ms = self.sync_timeout.as_millis() as u64,
                    "Sync call timed out"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Deliver one inbound envelope.
    ///
    /// Replies complete their pending call. Posts and calls are typed and
    /// routed to the handler for their name; a call always gets a reply,
    /// empty when nothing answered it.
    pub fn receive(self: &Arc<Self>, envelope: Envelope) -> Result<()> {
        self.ensure_open()?;
        self.trace(Direction::Inbound, &envelope);

        match envelope {
            Envelope::Reply { id, message } => {
                let slot = lock(&self.pending).remove(&id);
                match slot {
                    Some(slot) => {
                        let _ = slot.send(message);
                    }
                    None => tracing::debug!(id, "Reply for unknown or expired call"),
                }
                Ok(())
            }
            Envelope::Post(raw) => {
                if let Some(response) = self.deliver(raw, Mode::Async, 0) {
                    tracing::debug!(name = response.name(), "Discarding response to async message");
                }
                Ok(())
            }
            Envelope::Call { id, message } => {
                let response = self.deliver(message, Mode::Sync, id);
                self.post(Envelope::Reply {
                    id,
                    message: response.map(|m| m.to_raw()),
                })
            }
        }
    }

    fn deliver(self: &Arc<Self>, raw: RawMessage, mode: Mode, id: u32) -> Option<Message> {
        let message = match Message::from_raw(raw) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(side = ?self.side, error = %e, "Dropping malformed message");
                return None;
            }
        };

        let handler = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .lookup(message.name());

        let ctx = HandlerContext::with_channel(
            message.name(),
            mode,
            id,
            ChannelHandle::new(Arc::clone(self)),
        );
        run_handler(handler, &message, &ctx)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("side", &self.side)
            .field("state", &self.state())
            .field("pending_calls", &self.pending_calls())
            .finish()
    }
}
