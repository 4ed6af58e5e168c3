//! The content script: everything the content side runs for one document.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::bridge::{AnswerSlot, ContentEvent, ContentEventBridge};
use super::document::Document;
use crate::channel::{Channel, ChannelHandle};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::message::{names, DataAnswer, Message, Side};
use crate::observer::{Observer, WINDOW_OPENED};
use crate::transport::Link;

/// Counts `window-opened` notifications.
#[derive(Debug, Default)]
pub struct WindowWatcher {
    opened: AtomicUsize,
}

impl WindowWatcher {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl Observer for WindowWatcher {
    fn observe(&self, topic: &str, subject: &str) {
        self.opened.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(topic, subject, "Observed topic");
    }
}

/// Content side of a channel bound to a [`Document`].
///
/// On attach it registers its handlers, subscribes to `window-opened` and
/// announces readiness to the host.
pub struct ContentScript {
    channel: Channel,
    document: Arc<Document>,
    watcher: Arc<WindowWatcher>,
    hellos: Arc<AtomicUsize>,
    answers: AnswerSlot,
    events: mpsc::UnboundedSender<ContentEvent>,
    bridge: JoinHandle<()>,
}

impl ContentScript {
    /// Attach a content script to `link`. Must be called inside a Tokio
    /// runtime.
    pub fn attach(link: Link, document: Arc<Document>, config: BridgeConfig) -> Result<Self> {
        let watcher = Arc::new(WindowWatcher::default());
        let hellos = Arc::new(AtomicUsize::new(0));
        let answers: AnswerSlot = Arc::new(watch::channel(None).0);

        let hello_count = hellos.clone();
        let doc = document.clone();
        let posted = answers.clone();

        let channel = Channel::builder(Side::Content)
            .config(config)
            .observe(WINDOW_OPENED, &watcher, true)
            .handle(names::HELLO, move |_msg, _ctx| {
                hello_count.fetch_add(1, Ordering::SeqCst);
                tracing::info!("Host said hello");
                None
            })
            .handle(names::SET_DISPLAY_PORT, move |msg, _ctx| {
                if let Message::SetDisplayPort(rect) = msg {
                    let changed = doc.apply_display_port(*rect);
                    tracing::info!(
                        x = rect.x,
                        y = rect.y,
                        width = rect.width,
                        height = rect.height,
                        changed,
                        "Display port"
                    );
                }
                None
            })
            .handle(names::DATA_ANSWER, move |msg, _ctx| {
                if let Message::DataAnswer(answer) = msg {
                    tracing::info!(id = %answer.id, val = %answer.val, "Data answer");
                    posted.send_replace(Some(answer.clone()));
                }
                None
            })
            .attach(link)?;

        let (events, events_rx) = mpsc::unbounded_channel();
        let bridge =
            ContentEventBridge::with_answers(channel.handle(), answers.clone()).spawn(events_rx);

        Ok(Self {
            channel,
            document,
            watcher,
            hellos,
            answers,
            events,
            bridge,
        })
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn channel(&self) -> ChannelHandle {
        self.channel.handle()
    }

    /// Number of `ChannelInit::Hello` messages received.
    pub fn hellos(&self) -> usize {
        self.hellos.load(Ordering::SeqCst)
    }

    /// Number of `window-opened` notifications observed.
    pub fn windows_opened(&self) -> usize {
        self.watcher.opened()
    }

    /// Latest answer from the host, whether posted or returned by a sync
    /// call.
    pub fn answers(&self) -> watch::Receiver<Option<DataAnswer>> {
        self.answers.subscribe()
    }

    /// Change the document title, raising a title-change event if it
    /// differs.
    pub fn set_title(&self, title: &str) -> Result<bool> {
        if self.channel.handle().is_torn_down() {
            return Err(BridgeError::ChannelTornDown);
        }
        if !self.document.set_title(title) {
            return Ok(false);
        }
        self.events
            .send(ContentEvent::TitleChanged(title.to_string()))
            .map_err(|_| BridgeError::ChannelTornDown)?;
        Ok(true)
    }

    /// Stored observer subscriptions for `topic`.
    pub fn subscription_count(&self, topic: &str) -> usize {
        self.channel.subscription_count(topic)
    }

    /// Deliver a `window-opened` notification for `subject`.
    pub fn notify_window_opened(&self, subject: &str) -> Result<usize> {
        self.channel.notify(WINDOW_OPENED, subject)
    }

    /// Tear the channel down and stop the event bridge.
    pub fn detach(&self) -> bool {
        self.bridge.abort();
        self.channel.detach()
    }
}

impl Drop for ContentScript {
    fn drop(&mut self) {
        self.bridge.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{DisplayPort, Envelope, RawMessage};
    use crate::transport::memory;

    #[tokio::test]
    async fn test_attach_announces_ready_and_subscribes() {
        let (mut host, content_link) = memory::pair();
        let script =
            ContentScript::attach(content_link, Arc::new(Document::default()), BridgeConfig::default())
                .unwrap();

        assert_eq!(host.recv().await.unwrap().name(), Some(names::READY));
        assert_eq!(script.notify_window_opened("chrome://browser").unwrap(), 1);
        assert_eq!(script.notify_window_opened("chrome://browser").unwrap(), 1);
        assert_eq!(script.windows_opened(), 2);
    }

    #[tokio::test]
    async fn test_handlers_apply_to_document() {
        let (host, content_link) = memory::pair();
        let document = Arc::new(Document::default());
        let script =
            ContentScript::attach(content_link, document.clone(), BridgeConfig::default()).unwrap();

        let rect = DisplayPort::new(0.0, 0.0, 480.0, 800.0);
        host.send(Envelope::Post(RawMessage::new(names::HELLO))).unwrap();
        host.send(Envelope::Post(Message::from(rect).to_raw())).unwrap();
        host.send(Envelope::Post(Message::from(DataAnswer::new("test", "2")).to_raw()))
            .unwrap();

        let mut answers = script.answers();
        let answer = answers.wait_for(Option::is_some).await.unwrap().clone();

        assert_eq!(answer, Some(DataAnswer::new("test", "2")));
        assert_eq!(script.hellos(), 1);
        assert_eq!(document.display_port(), Some(rect));
    }

    #[tokio::test]
    async fn test_set_title_after_detach() {
        let (_host, content_link) = memory::pair();
        let script =
            ContentScript::attach(content_link, Arc::new(Document::default()), BridgeConfig::default())
                .unwrap();

        assert!(script.detach());
        assert!(matches!(
            script.set_title("late"),
            Err(BridgeError::ChannelTornDown)
        ));
        assert!(matches!(
            script.notify_window_opened("w"),
            Err(BridgeError::ChannelTornDown)
        ));
    }
}
