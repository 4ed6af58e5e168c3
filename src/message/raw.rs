//! Untyped wire form of a message.

use serde::{Deserialize, Serialize};

use super::value::{fields_from_json, Fields, Value};
use crate::error::Result;

/// A message as it travels between host and content: a name and a flat
/// field map. Typed access goes through [`Message::from_raw`](super::Message::from_raw).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Namespaced message name (`"<Namespace>::<Verb>"`).
    pub name: String,
    /// Flat payload.
    #[serde(default)]
    pub fields: Fields,
}

impl RawMessage {
    /// Create a message with an empty payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Fields::new(),
        }
    }

    /// Create a message from a name and a JSON object payload.
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            fields: fields_from_json(json)?,
        })
    }

    /// Add a field, builder style.
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Namespace part of the name (`"Viewport"` for `"Viewport::SetDisplayPort"`).
    pub fn namespace(&self) -> Option<&str> {
        self.name.split_once("::").map(|(ns, _)| ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace() {
        assert_eq!(
            RawMessage::new("Viewport::SetDisplayPort").namespace(),
            Some("Viewport")
        );
        assert_eq!(RawMessage::new("bare").namespace(), None);
    }

    #[test]
    fn test_from_json() {
        let raw = RawMessage::from_json("Data::Get", r#"{"val":"1"}"#).unwrap();
        assert_eq!(raw, RawMessage::new("Data::Get").with_field("val", "1"));
    }
}
