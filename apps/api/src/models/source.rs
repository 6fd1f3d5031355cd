//! The flat data record a document is rendered from.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys that may hold the narrative result description, most specific first.
pub const NARRATIVE_KEYS: &[&str] = &["result_description", "description", "result_text"];

/// Flat merge of student, test, attempt and result attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRecord(Map<String, Value>);

impl SourceRecord {
    /// Accepts a JSON object; anything else yields `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Scalar value rendered as display text. Empty strings count as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(value_to_text)
    }

    /// First key in `keys` that yields text.
    pub fn first_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.text(key))
    }

    /// Numeric value; numeric strings are accepted.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn first_number(&self, keys: &[&str]) -> Option<f64> {
        keys.iter().find_map(|key| self.number(key))
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" | "pass" | "passed" => Some(true),
                "false" | "no" | "0" | "fail" | "failed" => Some(false),
                _ => None,
            },
            Value::Number(n) => n.as_i64().map(|v| v != 0),
            _ => None,
        }
    }

    /// Overlays `overrides` key by key; override values win.
    pub fn merge(&mut self, overrides: Map<String, Value>) {
        for (key, value) in overrides {
            self.0.insert(key, value);
        }
    }

    /// Sets `key` only when it is absent or null.
    pub fn insert_missing(&mut self, key: &str, value: impl Into<Value>) {
        if self.get(key).is_none() {
            self.0.insert(key.to_string(), value.into());
        }
    }

    /// The narrative description as text. Structured mappings are returned
    /// in serialized form so the segment parser can pass them through.
    pub fn narrative_text(&self) -> Option<String> {
        NARRATIVE_KEYS.iter().find_map(|key| match self.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            value @ Value::Object(_) => Some(value.to_string()),
            _ => None,
        })
    }
}

/// Display form of a scalar JSON value.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i.to_string()),
            None => n.as_f64().map(format_number),
        },
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Formats a number with at most two decimals and no trailing zeros.
pub fn format_number(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
