//! The active document a content script drives.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::message::DisplayPort;

#[derive(Debug, Default)]
struct State {
    title: String,
    display_port: Option<DisplayPort>,
    revision: u64,
}

/// Document region state shared between handlers and the embedder.
///
/// `revision` counts display port changes that actually altered the region,
/// so re-applying the same rectangle is observable as a no-op.
#[derive(Debug, Default)]
pub struct Document {
    state: Mutex<State>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(State {
                title: title.into(),
                ..State::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `rect` as the active renderable area.
    ///
    /// Returns `false` when the region already equals `rect` or `rect` has
    /// a non-finite coordinate.
    pub fn apply_display_port(&self, rect: DisplayPort) -> bool {
        if !rect.is_finite() {
            tracing::warn!(?rect, "Ignoring non-finite display port");
            return false;
        }
        let mut state = self.state();
        if state.display_port == Some(rect) {
            return false;
        }
        state.display_port = Some(rect);
        state.revision += 1;
        true
    }

    pub fn display_port(&self) -> Option<DisplayPort> {
        self.state().display_port
    }

    pub fn revision(&self) -> u64 {
        self.state().revision
    }

    pub fn title(&self) -> String {
        self.state().title.clone()
    }

    /// Replace the title. Returns `false` if it did not change.
    pub fn set_title(&self, title: &str) -> bool {
        let mut state = self.state();
        if state.title == title {
            return false;
        }
        state.title = title.to_string();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_display_port_ignored() {
        let doc = Document::default();
        let rect = DisplayPort::new(0.0, f64::NAN, 10.0, 10.0);

        for _ in 0..3 {
            assert!(!doc.apply_display_port(rect));
        }
        assert_eq!(doc.display_port(), None);
        assert_eq!(doc.revision(), 0);
    }

    #[test]
    fn test_display_port_applied_exactly() {
        let doc = Document::default();
        let rect = DisplayPort::new(0.0, 0.0, 980.0, 1200.5);

        assert!(doc.apply_display_port(rect));
        assert_eq!(doc.display_port(), Some(rect));
        assert_eq!(doc.revision(), 1);
    }

    #[test]
    fn test_reapplying_same_rect_is_noop() {
        let doc = Document::default();
        let rect = DisplayPort::new(10.0, 20.0, 300.0, 400.0);

        assert!(doc.apply_display_port(rect));
        assert!(!doc.apply_display_port(rect));
        assert!(!doc.apply_display_port(rect));
        assert_eq!(doc.revision(), 1);

        assert!(doc.apply_display_port(DisplayPort::new(10.0, 20.0, 300.0, 401.0)));
        assert_eq!(doc.revision(), 2);
    }

    #[test]
    fn test_title() {
        let doc = Document::new("about:blank");
        assert_eq!(doc.title(), "about:blank");
        assert!(doc.set_title("Example"));
        assert!(!doc.set_title("Example"));
        assert_eq!(doc.title(), "Example");
    }
}
