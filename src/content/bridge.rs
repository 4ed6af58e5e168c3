//! Content event bridge.
//!
//! Turns content-level events into outbound traffic. A title change performs
//! a blocking `Data::Get` round trip and reports the echoed answer.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::channel::ChannelHandle;
use crate::error::{BridgeError, Result};
use crate::message::{DataAnswer, DataRequest, Message};

/// Events raised inside the content document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentEvent {
    /// The document title changed to the given value.
    TitleChanged(String),
}

/// Value requested from the host on every title change.
pub const TITLE_CHANGE_REQUEST: &str = "1";

/// Latest answer obtained from the host, shared with other producers.
pub type AnswerSlot = Arc<watch::Sender<Option<DataAnswer>>>;

pub struct ContentEventBridge {
    channel: ChannelHandle,
    answers: AnswerSlot,
}

impl ContentEventBridge {
    pub fn new(channel: ChannelHandle) -> Self {
        Self::with_answers(channel, Arc::new(watch::channel(None).0))
    }

    /// Publish answers into an existing slot.
    pub fn with_answers(channel: ChannelHandle, answers: AnswerSlot) -> Self {
        Self { channel, answers }
    }

    /// Receiver that sees every answer the bridge obtains.
    pub fn answers(&self) -> watch::Receiver<Option<DataAnswer>> {
        self.answers.subscribe()
    }

    /// Handle one event.
    ///
    /// An empty sync result is logged and yields `Ok(None)`; only a torn
    /// down channel is an error.
    pub async fn on_event(&self, event: &ContentEvent) -> Result<Option<DataAnswer>> {
        let ContentEvent::TitleChanged(title) = event;
        tracing::info!(title = %title, "Title changed");

        let results = self
            .channel
            .send_sync(DataRequest::new(TITLE_CHANGE_REQUEST))
            .await?;

        match results.into_iter().next() {
            Some(Message::DataAnswer(answer)) => {
                tracing::info!(id = %answer.id, val = %answer.val, "Host answered");
                self.answers.send_replace(Some(answer.clone()));
                Ok(Some(answer))
            }
            Some(other) => {
                tracing::warn!(name = other.name(), "Unexpected reply to data request");
                Ok(None)
            }
            None => {
                tracing::info!("No responder for data request");
                Ok(None)
            }
        }
    }

    /// Process events until the sender side closes or the channel is torn
    /// down.
    pub fn spawn(self, mut events: mpsc::UnboundedReceiver<ContentEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match self.on_event(&event).await {
                    Ok(_) => {}
                    Err(BridgeError::ChannelTornDown) => break,
                    Err(e) => tracing::warn!(error = %e, "Event bridge failed"),
                }
            }
            tracing::debug!("Event bridge stopped");
        })
    }
}
