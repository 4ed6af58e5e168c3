//! Lifecycle topic subscriptions.
//!
//! An [`ObserverManager`] belongs to one channel. Subscriptions never own
//! their holder: the manager keeps a `(topic, subscriber id)` relation plus a
//! [`Weak`] handle, and checks liveness before every notification. Once the
//! holder is dropped its subscriptions are inert and are pruned the next time
//! their topic is notified.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use content_bridge::observer::{Observer, ObserverManager, WINDOW_OPENED};
//!
//! #[derive(Default)]
//! struct Counter(AtomicUsize);
//!
//! impl Observer for Counter {
//!     fn observe(&self, _topic: &str, _subject: &str) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(Counter::default());
//! let mut manager = ObserverManager::new();
//! manager.subscribe(WINDOW_OPENED, &counter, true);
//!
//! assert_eq!(manager.notify(WINDOW_OPENED, "about:blank"), 1);
//! drop(counter);
//! assert_eq!(manager.notify(WINDOW_OPENED, "about:blank"), 0);
//! ```

use std::sync::{Arc, Weak};

/// Topic raised when the host opens a new window.
pub const WINDOW_OPENED: &str = "window-opened";

/// Receiver of topic notifications.
pub trait Observer: Send + Sync {
    /// Called once per notification of a subscribed topic.
    ///
    /// `subject` identifies what triggered the notification.
    fn observe(&self, topic: &str, subject: &str);
}

/// Identifier of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

struct Subscription {
    id: SubscriberId,
    topic: String,
    persistent: bool,
    holder: Weak<dyn Observer>,
}

/// Per-channel subscription table.
///
/// Delivery within a topic follows subscription order.
#[derive(Default)]
pub struct ObserverManager {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl ObserverManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `holder` to `topic` without extending its lifetime.
    ///
    /// A non-persistent subscription is removed after its first delivery.
    pub fn subscribe<O>(&mut self, topic: &str, holder: &Arc<O>, persistent: bool) -> SubscriberId
    where
        O: Observer + 'static,
    {
        self.next_id += 1;
        let id = SubscriberId(self.next_id);
        let weak: Weak<O> = Arc::downgrade(holder);
        let holder: Weak<dyn Observer> = weak;

        self.subscriptions.push(Subscription {
            id,
            topic: topic.to_string(),
            persistent,
            holder,
        });
        tracing::trace!(topic, id = id.0, persistent, "Subscribed observer");
        id
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|sub| sub.id != id);
        self.subscriptions.len() != before
    }

    /// Take the live observers due for a notification of `topic`.
    ///
    /// Expired subscriptions for the topic are pruned and one-shot
    /// subscriptions are consumed. The caller invokes the returned
    /// observers, which lets it release any lock around the manager first.
    pub fn collect(&mut self, topic: &str) -> Vec<Arc<dyn Observer>> {
        let mut due = Vec::new();
        let mut pruned = 0usize;

        self.subscriptions.retain(|sub| {
            if sub.topic != topic {
                return true;
            }
            match sub.holder.upgrade() {
                Some(observer) => {
                    due.push(observer);
                    sub.persistent
                }
                None => {
                    pruned += 1;
                    false
                }
            }
        });

        if pruned > 0 {
            tracing::debug!(topic, pruned, "Pruned expired subscriptions");
        }
        due
    }

    /// Notify every live subscriber of `topic`. Returns how many were invoked.
    pub fn notify(&mut self, topic: &str, subject: &str) -> usize {
        let due = self.collect(topic);
        for observer in &due {
            observer.observe(topic, subject);
        }
        due.len()
    }

    /// Number of stored subscriptions for `topic`, live or not yet pruned.
    pub fn subscription_count(&self, topic: &str) -> usize {
        self.subscriptions
            .iter()
            .filter(|sub| sub.topic == topic)
            .count()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Drop every subscription.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        label: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl Observer for Recorder {
        fn observe(&self, topic: &str, subject: &str) {
            self.seen
                .lock()
                .unwrap()
                .push(format!("{}:{}:{}", self.label, topic, subject));
        }
    }

    fn recorder(label: &'static str, seen: &Arc<Mutex<Vec<String>>>) -> Arc<Recorder> {
        Arc::new(Recorder {
            label,
            seen: seen.clone(),
        })
    }

    #[test]
    fn test_one_shot_fires_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let holder = recorder("a", &seen);
        let mut manager = ObserverManager::new();
        manager.subscribe(WINDOW_OPENED, &holder, false);

        assert_eq!(manager.notify(WINDOW_OPENED, "w1"), 1);
        assert_eq!(manager.notify(WINDOW_OPENED, "w2"), 0);
        assert_eq!(manager.notify(WINDOW_OPENED, "w3"), 0);

        assert_eq!(*seen.lock().unwrap(), vec!["a:window-opened:w1"]);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_persistent_fires_until_dropped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let holder = recorder("a", &seen);
        let mut manager = ObserverManager::new();
        manager.subscribe(WINDOW_OPENED, &holder, true);

        for _ in 0..3 {
            assert_eq!(manager.notify(WINDOW_OPENED, "w"), 1);
        }
        drop(holder);

        assert_eq!(manager.subscription_count(WINDOW_OPENED), 1);
        assert_eq!(manager.notify(WINDOW_OPENED, "w"), 0);
        assert_eq!(manager.subscription_count(WINDOW_OPENED), 0);
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_fifo_within_topic() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let first = recorder("first", &seen);
        let second = recorder("second", &seen);
        let third = recorder("third", &seen);

        let mut manager = ObserverManager::new();
        manager.subscribe(WINDOW_OPENED, &first, true);
        manager.subscribe(WINDOW_OPENED, &second, false);
        manager.subscribe(WINDOW_OPENED, &third, true);

        manager.notify(WINDOW_OPENED, "w");

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "first:window-opened:w",
                "second:window-opened:w",
                "third:window-opened:w"
            ]
        );
    }

    #[test]
    fn test_topics_are_independent() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let holder = recorder("a", &seen);
        let mut manager = ObserverManager::new();
        manager.subscribe(WINDOW_OPENED, &holder, false);
        manager.subscribe("xpcom-shutdown", &holder, false);

        assert_eq!(manager.notify("xpcom-shutdown", "app"), 1);
        assert_eq!(manager.subscription_count(WINDOW_OPENED), 1);
        assert_eq!(manager.notify("unrelated", "x"), 0);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let holder = recorder("a", &seen);
        let mut manager = ObserverManager::new();
        let id = manager.subscribe(WINDOW_OPENED, &holder, true);

        assert!(manager.unsubscribe(id));
        assert!(!manager.unsubscribe(id));
        assert_eq!(manager.notify(WINDOW_OPENED, "w"), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_subscription_does_not_keep_holder_alive() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let holder = recorder("a", &seen);
        let mut manager = ObserverManager::new();
        manager.subscribe(WINDOW_OPENED, &holder, true);

        assert_eq!(Arc::strong_count(&holder), 1);
    }
}
