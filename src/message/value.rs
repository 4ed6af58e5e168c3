//! Flat scalar payload values.
//!
//! A payload is a flat map of field name to scalar. Nested maps or arrays
//! fail to deserialize, which keeps every payload one level deep.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single scalar payload field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean field.
    Bool(bool),
    /// Integer field.
    Int(i64),
    /// Floating point field.
    Float(f64),
    /// String field.
    Str(String),
}

impl Value {
    /// Numeric view of the value; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Integer view of the value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean view of the value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// String view of the value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// Flat payload: field name to scalar, ordered by name.
pub type Fields = BTreeMap<String, Value>;

/// Parse a JSON object into flat payload fields.
///
/// An empty string is treated as `{}`.
pub fn fields_from_json(json: &str) -> crate::error::Result<Fields> {
    if json.trim().is_empty() {
        return Ok(Fields::new());
    }
    Ok(serde_json::from_str(json)?)
}

/// Render payload fields as a JSON object string.
pub fn fields_to_json(fields: &Fields) -> crate::error::Result<String> {
    Ok(serde_json::to_string(fields)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::Int(4).as_f64(), Some(4.0));
        assert_eq!(Value::Float(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::Str("4".into()).as_f64(), None);
        assert_eq!(Value::Bool(true).as_f64(), None);
        assert_eq!(Value::Float(2.5).as_i64(), None);
    }

    #[test]
    fn test_fields_from_json() {
        let fields = fields_from_json(r#"{"x": 1, "y": 2.5, "val": "1", "on": false}"#).unwrap();

        assert_eq!(fields["x"], Value::Int(1));
        assert_eq!(fields["y"], Value::Float(2.5));
        assert_eq!(fields["val"], Value::Str("1".into()));
        assert_eq!(fields["on"], Value::Bool(false));
    }

    #[test]
    fn test_fields_from_empty_json() {
        assert!(fields_from_json("").unwrap().is_empty());
        assert!(fields_from_json("{}").unwrap().is_empty());
    }

    #[test]
    fn test_fields_from_json_rejects_nesting() {
        assert!(fields_from_json(r#"{"rect": {"x": 1}}"#).is_err());
        assert!(fields_from_json(r#"{"list": [1, 2]}"#).is_err());
        assert!(fields_from_json(r#"{"gone": null}"#).is_err());
        assert!(fields_from_json(r#"[1, 2]"#).is_err());
    }

    #[test]
    fn test_fields_to_json() {
        let mut fields = Fields::new();
        fields.insert("id".into(), "test".into());
        fields.insert("val".into(), "2".into());

        let json = fields_to_json(&fields).unwrap();
        assert_eq!(json, r#"{"id":"test","val":"2"}"#);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Str("abc".into()).to_string(), "abc");
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }
}
