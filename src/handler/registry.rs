//! Handler registry for dispatching messages by name.
//!
//! At most one handler exists per name; registering a name again replaces
//! the previous handler. Dispatching a name with no handler is not an error
//! at this layer: it yields no response and a debug diagnostic. A handler
//! that panics is logged and also yields no response.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::HandlerContext;
use crate::error::{BridgeError, Result};
use crate::message::Message;

/// What a handler hands back: the response for sync deliveries, if any.
pub type HandlerResult = Option<Message>;

/// Trait for message handlers.
///
/// Implemented for every `Fn(&Message, &HandlerContext) -> HandlerResult`.
pub trait Handler: Send + Sync + 'static {
    /// Handle one inbound message.
    fn call(&self, message: &Message, ctx: &HandlerContext) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&Message, &HandlerContext) -> HandlerResult + Send + Sync + 'static,
{
    fn call(&self, message: &Message, ctx: &HandlerContext) -> HandlerResult {
        (self)(message, ctx)
    }
}

/// Registry mapping message names to handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `name`.
    ///
    /// Returns `true` if an existing handler was replaced.
    pub fn register<F>(&mut self, name: &str, handler: F) -> bool
    where
        F: Fn(&Message, &HandlerContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.register_arc(name, Arc::new(handler))
    }

    /// Register an already shared handler.
    pub fn register_arc(&mut self, name: &str, handler: Arc<dyn Handler>) -> bool {
        let replaced = self.handlers.insert(name.to_string(), handler).is_some();
        if replaced {
            tracing::debug!(name, "Replaced message handler");
        }
        replaced
    }

    /// Remove the handler for `name`. Returns `true` if one was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    /// Get a handle to the handler for `name`.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(name).cloned()
    }

    /// Like [`get`](Self::get), reporting a missing handler as
    /// [`BridgeError::UnknownMessage`].
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Handler>> {
        self.get(name)
            .ok_or_else(|| BridgeError::UnknownMessage(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Drop every handler.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Dispatch a message, reporting a missing handler as
    /// [`BridgeError::UnknownMessage`].
    pub fn try_dispatch(&self, message: &Message, ctx: &HandlerContext) -> Result<HandlerResult> {
        let handler = self.lookup(message.name())?;
        Ok(invoke(handler.as_ref(), message, ctx))
    }

    /// Dispatch a message; unknown names are logged and yield `None`.
    pub fn dispatch(&self, message: &Message, ctx: &HandlerContext) -> HandlerResult {
        run_handler(self.lookup(message.name()), message, ctx)
    }
}

/// Run a looked-up handler outside any registry lock.
///
/// A missing handler is logged at debug and yields `None`.
pub(crate) fn run_handler(
    handler: Result<Arc<dyn Handler>>,
    message: &Message,
    ctx: &HandlerContext,
) -> HandlerResult {
    match handler {
        Ok(handler) => invoke(handler.as_ref(), message, ctx),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring message");
            None
        }
    }
}

fn invoke(handler: &dyn Handler, message: &Message, ctx: &HandlerContext) -> HandlerResult {
    match panic::catch_unwind(AssertUnwindSafe(|| handler.call(message, ctx))) {
        Ok(response) => response,
        Err(_) => {
            tracing::error!(name = message.name(), "Message handler panicked");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{names, DataAnswer, DataRequest, Mode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx(name: &str) -> HandlerContext {
        HandlerContext::new(name, Mode::Async, 0)
    }

    #[test]
    fn test_register_and_dispatch() {
        let mut registry = HandlerRegistry::new();
        registry.register(names::DATA_GET, |msg, _ctx| match msg {
            Message::DataGet(req) => Some(DataAnswer::new("test", req.val.clone()).into()),
            _ => None,
        });

        let response = registry.dispatch(
            &Message::DataGet(DataRequest::new("7")),
            &ctx(names::DATA_GET),
        );
        assert_eq!(response, Some(Message::DataAnswer(DataAnswer::new("test", "7"))));
    }

    #[test]
    fn test_reregister_replaces() {
        let mut registry = HandlerRegistry::new();

        assert!(!registry.register(names::HELLO, |_, _| None));
        assert!(registry.register(names::HELLO, |_, _| Some(Message::Ready)));
        assert_eq!(registry.len(), 1);

        let response = registry.dispatch(&Message::Hello, &ctx(names::HELLO));
        assert_eq!(response, Some(Message::Ready));
    }

    #[test]
    fn test_unregister() {
        let mut registry = HandlerRegistry::new();
        registry.register(names::HELLO, |_, _| None);

        assert!(registry.unregister(names::HELLO));
        assert!(!registry.unregister(names::HELLO));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_name_is_silent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut registry = HandlerRegistry::new();
        registry.register(names::HELLO, move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            None
        });

        let unknown = Message::unknown("Gesture::SingleTap", Default::default());
        assert_eq!(registry.dispatch(&unknown, &ctx("Gesture::SingleTap")), None);
        assert!(matches!(
            registry.try_dispatch(&unknown, &ctx("Gesture::SingleTap")),
            Err(BridgeError::UnknownMessage(name)) if name == "Gesture::SingleTap"
        ));

        assert_eq!(registry.names(), vec![names::HELLO]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panicking_handler_yields_no_response() {
        let mut registry = HandlerRegistry::new();
        registry.register(names::DATA_GET, |_, _| panic!("handler failed"));
        registry.register(names::HELLO, |_, _| Some(Message::Ready));

        let request = Message::DataGet(DataRequest::new("1"));
        assert_eq!(registry.dispatch(&request, &ctx(names::DATA_GET)), None);
        assert!(matches!(
            registry.try_dispatch(&request, &ctx(names::DATA_GET)),
            Ok(None)
        ));

        // The registry stays usable afterwards.
        assert_eq!(
            registry.dispatch(&Message::Hello, &ctx(names::HELLO)),
            Some(Message::Ready)
        );
    }

    #[test]
    fn test_names_sorted() {
        let mut registry = HandlerRegistry::new();
        registry.register(names::SET_DISPLAY_PORT, |_, _| None);
        registry.register(names::DATA_ANSWER, |_, _| None);
        registry.register(names::HELLO, |_, _| None);

        assert_eq!(
            registry.names(),
            vec![names::HELLO, names::DATA_ANSWER, names::SET_DISPLAY_PORT]
        );
    }
}
