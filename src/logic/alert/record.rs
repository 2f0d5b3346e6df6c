//! Alert Record - one flattened security alert
//!
//! Field names are dotted paths (`rule.level`, `data.win.eventdata.image`).
//! Any field may be absent; `null` is stored as absent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// FIELD VALUE
// ============================================================================

/// Scalar value of a flattened alert field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// String form used by categorical and text features
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Bool(b) => b.to_string(),
        }
    }

    /// Numeric coercion; `None` when the value is not a finite number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            FieldValue::Number(_) => None,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            FieldValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            Value::Number(n) => n.as_f64().map(FieldValue::Number),
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            // Lists stay as their compact JSON text
            Value::Array(_) | Value::Object(_) => Some(FieldValue::Text(value.to_string())),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// Integral numbers render without a fractional part (`5710`, not `5710.0`)
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// ============================================================================
// ALERT RECORD
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl AlertRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten a JSON object into dotted field names
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut record = Self::new();
        for (key, child) in object {
            flatten_into(&mut record.fields, key, child);
        }
        Some(record)
    }

    /// Builder-style insert, handy for tests and adapters
    pub fn with(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<FieldValue>) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    // ------------------------------------------------------------------------
    // Typed "get field or default" lookups
    // ------------------------------------------------------------------------

    /// Text value if the field is present
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).map(FieldValue::as_text)
    }

    /// Text value, or `default` when the field is absent
    pub fn text_or(&self, key: &str, default: &str) -> String {
        self.text(key).unwrap_or_else(|| default.to_string())
    }

    /// Numeric value, or `default` when absent or not numeric
    pub fn number_or(&self, key: &str, default: f64) -> f64 {
        self.get(key).and_then(FieldValue::as_number).unwrap_or(default)
    }
}

fn flatten_into(out: &mut BTreeMap<String, FieldValue>, key: &str, value: &Value) {
    if let Value::Object(children) = value {
        for (child_key, child) in children {
            flatten_into(out, &format!("{}.{}", key, child_key), child);
        }
        return;
    }

    if let Some(field) = FieldValue::from_json(value) {
        out.insert(key.to_string(), field);
    }
}
