//! Safe field access over loosely-typed model output.
//!
//! Models sometimes nest JSON inside JSON (`"work": "[{...}]"`), so every field is
//! first lifted into a `RawValue` and then normalized to the shape the caller expects.
//! None of these functions fail; each falls back to an empty/default value.

use serde_json::{Map, Value};

use crate::extraction::sanitize::{clean_text, clean_value};
use crate::extraction::tolerant::parse_tolerant;

/// A field value as it arrived from the model, reduced to the three shapes we care about.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    List(Vec<Value>),
    Map(Map<String, Value>),
}

impl RawValue {
    /// Scalars (null, numbers, booleans) collapse into `Text` via the sanitizer's stringification.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Array(items) => RawValue::List(items.clone()),
            Value::Object(map) => RawValue::Map(map.clone()),
            Value::String(s) => RawValue::Text(s.clone()),
            other => RawValue::Text(clean_value(other)),
        }
    }

    /// Normalizes to a sequence. String-encoded JSON is re-parsed; anything else is `None`.
    pub fn into_list(self) -> Option<Vec<Value>> {
        match self {
            RawValue::List(items) => Some(items),
            RawValue::Text(text) => match parse_tolerant(&text) {
                Ok(Value::Array(items)) => Some(items),
                _ => None,
            },
            RawValue::Map(_) => None,
        }
    }

    /// Normalizes to a mapping. String-encoded JSON is re-parsed; anything else is `None`.
    pub fn into_map(self) -> Option<Map<String, Value>> {
        match self {
            RawValue::Map(map) => Some(map),
            RawValue::Text(text) => match parse_tolerant(&text) {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            },
            RawValue::List(_) => None,
        }
    }

    /// Normalizes to sanitized text with the sanitizer's stringification rules:
    /// lists are comma-joined, mappings become their compact JSON text.
    pub fn into_text(self) -> String {
        match self {
            RawValue::Text(text) => clean_text(&text),
            RawValue::List(items) => clean_value(&Value::Array(items)),
            RawValue::Map(map) => clean_value(&Value::Object(map)),
        }
    }
}

/// Returns the sanitized value at `key`, or the sanitized `default` when `data`
/// is not a mapping or the key is absent.
pub fn scalar_field(data: &Value, key: &str, default: &str) -> String {
    match data.as_object().and_then(|map| map.get(key)) {
        Some(value) => RawValue::from_json(value).into_text(),
        None => clean_text(default),
    }
}

/// Returns the sequence at `key`. Strings are tolerant-parsed and kept only if they
/// decode to a sequence; every other case yields `default`.
pub fn sequence_field(data: &Value, key: &str, default: Vec<Value>) -> Vec<Value> {
    data.as_object()
        .and_then(|map| map.get(key))
        .and_then(|value| RawValue::from_json(value).into_list())
        .unwrap_or(default)
}

/// Mapping counterpart of `sequence_field`; falls back to an empty mapping.
pub fn mapping_field(data: &Value, key: &str) -> Map<String, Value> {
    data.as_object()
        .and_then(|map| map.get(key))
        .and_then(|value| RawValue::from_json(value).into_map())
        .unwrap_or_default()
}
