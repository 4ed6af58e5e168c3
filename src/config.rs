//! Channel configuration and host preferences.
//!
//! [`Preferences`] is the host's static key/value store, read once at
//! startup and never written by the bridge. [`BridgeConfig`] holds the
//! tunables a channel actually uses and can be derived from preferences.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::Result;
use crate::message::Value;
use crate::protocol::DEFAULT_MAX_PAYLOAD_SIZE;

/// Default time a sync call waits for its reply before resolving to
/// "no responder".
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of frames the stream writer coalesces into one write.
pub const DEFAULT_WRITE_BATCH: usize = 64;

/// Preference key for [`BridgeConfig::sync_timeout`], in milliseconds.
pub const PREF_SYNC_TIMEOUT_MS: &str = "bridge.sync_timeout_ms";

/// Preference key for [`BridgeConfig::max_payload_size`], in bytes.
pub const PREF_MAX_PAYLOAD_SIZE: &str = "bridge.max_payload_size";

/// Configuration for a channel and its link.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// How long `send_sync` waits before resolving to an empty result.
    pub sync_timeout: Duration,
    /// Largest payload accepted from a framed stream.
    pub max_payload_size: u32,
    /// Maximum frames per stream write.
    pub write_batch: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            write_batch: DEFAULT_WRITE_BATCH,
        }
    }
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sync call timeout.
    pub fn sync_timeout(mut self, timeout: Duration) -> Self {
        self.sync_timeout = timeout;
        self
    }

    /// Set the maximum accepted payload size.
    pub fn max_payload_size(mut self, size: u32) -> Self {
        self.max_payload_size = size;
        self
    }

    /// Set the stream writer batch size (at least 1).
    pub fn write_batch(mut self, frames: usize) -> Self {
        self.write_batch = frames.max(1);
        self
    }

    /// Build a configuration from host preferences.
    ///
    /// Missing keys keep their defaults; keys with the wrong type or a
    /// non-positive value are logged and ignored.
    pub fn from_preferences(prefs: &Preferences) -> Self {
        let mut config = Self::default();

        match prefs.get_int(PREF_SYNC_TIMEOUT_MS) {
            Some(ms) if ms > 0 => config.sync_timeout = Duration::from_millis(ms as u64),
            Some(ms) => {
                tracing::warn!(key = PREF_SYNC_TIMEOUT_MS, value = ms, "Ignoring non-positive preference")
            }
            None => warn_if_mistyped(prefs, PREF_SYNC_TIMEOUT_MS),
        }

        match prefs.get_int(PREF_MAX_PAYLOAD_SIZE) {
            Some(size) if size > 0 && size <= u32::MAX as i64 => {
                config.max_payload_size = size as u32
            }
            Some(size) => {
                tracing::warn!(key = PREF_MAX_PAYLOAD_SIZE, value = size, "Ignoring out-of-range preference")
            }
            None => warn_if_mistyped(prefs, PREF_MAX_PAYLOAD_SIZE),
        }

        config
    }
}

fn warn_if_mistyped(prefs: &Preferences, key: &str) {
    if let Some(value) = prefs.get(key) {
        tracing::warn!(
            key,
            found = value.type_name(),
            "Preference has the wrong type, using default"
        );
    }
}

/// Read-only host preferences (string keys; bool, number or string values).
#[derive(Debug, Clone, Default)]
pub struct Preferences {
    values: HashMap<String, Value>,
}

impl Preferences {
    /// Load preferences from a flat JSON object.
    ///
    /// # Example
    ///
    /// ```
    /// use content_bridge::config::Preferences;
    ///
    /// let prefs = Preferences::from_json(r#"{"plugin.disable": true, "ui.dragThresholdX": 25}"#).unwrap();
    /// assert_eq!(prefs.get_bool("plugin.disable"), Some(true));
    /// assert_eq!(prefs.get_int("ui.dragThresholdX"), Some(25));
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let values: HashMap<String, Value> = serde_json::from_str(json)?;
        Ok(Self { values })
    }

    /// Build preferences from key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = BridgeConfig::default();
        assert_eq!(config.sync_timeout, DEFAULT_SYNC_TIMEOUT);
        assert_eq!(config.max_payload_size, DEFAULT_MAX_PAYLOAD_SIZE);
        assert_eq!(config.write_batch, DEFAULT_WRITE_BATCH);
    }

    #[test]
    fn test_config_builder() {
        let config = BridgeConfig::new()
            .sync_timeout(Duration::from_millis(250))
            .max_payload_size(4096)
            .write_batch(0);

        assert_eq!(config.sync_timeout, Duration::from_millis(250));
        assert_eq!(config.max_payload_size, 4096);
        assert_eq!(config.write_batch, 1);
    }

    #[test]
    fn test_config_from_preferences() {
        let prefs = Preferences::from_json(
            r#"{"bridge.sync_timeout_ms": 1500, "bridge.max_payload_size": 65536, "gfx.use_tiled_thebes": true}"#,
        )
        .unwrap();

        let config = BridgeConfig::from_preferences(&prefs);
        assert_eq!(config.sync_timeout, Duration::from_millis(1500));
        assert_eq!(config.max_payload_size, 65536);
    }

    #[test]
    fn test_config_ignores_bad_preferences() {
        let prefs = Preferences::from_pairs([
            (PREF_SYNC_TIMEOUT_MS, Value::from("soon")),
            (PREF_MAX_PAYLOAD_SIZE, Value::from(-1)),
        ]);

        let config = BridgeConfig::from_preferences(&prefs);
        assert_eq!(config.sync_timeout, DEFAULT_SYNC_TIMEOUT);
        assert_eq!(config.max_payload_size, DEFAULT_MAX_PAYLOAD_SIZE);
    }

    #[test]
    fn test_preferences_typed_getters() {
        let prefs = Preferences::from_json(
            r##"{"ui.menu": "#f7f5f3", "gfx.axis.fling_friction": 0.00345, "plugin.disable": true}"##,
        )
        .unwrap();

        assert_eq!(prefs.len(), 3);
        assert_eq!(prefs.get_str("ui.menu"), Some("#f7f5f3"));
        assert_eq!(prefs.get_float("gfx.axis.fling_friction"), Some(0.00345));
        assert_eq!(prefs.get_bool("plugin.disable"), Some(true));
        assert_eq!(prefs.get_bool("ui.menu"), None);
        assert_eq!(prefs.get_int("missing"), None);
    }

    #[test]
    fn test_preferences_reject_nested_values() {
        assert!(Preferences::from_json(r#"{"a": {"b": 1}}"#).is_err());
    }
}
