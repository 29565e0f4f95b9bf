//! Recursive redaction of JSON values.

use serde_json::{Map, Value};

use crate::detect::SecretDetector;
use crate::keys::is_sensitive_key;

/// Replacement for redacted values.
pub const REDACTED: &str = "[REDACTED]";

/// Redacts sensitive keys and secret-shaped strings from JSON values.
#[derive(Clone, Default)]
pub struct Redactor {
    detector: SecretDetector,
    extra_keys: Vec<String>,
}

impl Redactor {
    pub fn new(detector: SecretDetector) -> Self {
        Self {
            detector,
            extra_keys: Vec::new(),
        }
    }

    /// Treat additional exact key names (case-insensitive) as sensitive.
    pub fn with_extra_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_keys
            .extend(keys.into_iter().map(|k| k.into().to_lowercase()));
        self
    }

    fn key_is_sensitive(&self, key: &str) -> bool {
        is_sensitive_key(key) || self.extra_keys.iter().any(|k| k == &key.to_lowercase())
    }

    /// Return a redacted copy of `value`.
    pub fn redact(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, inner) in map {
                    let redacted = if self.key_is_sensitive(key) {
                        Value::String(REDACTED.to_string())
                    } else {
                        self.redact(inner)
                    };
                    out.insert(key.clone(), redacted);
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(items.iter().map(|v| self.redact(v)).collect()),
            Value::String(s) => match self.detector.detect(s) {
                Some(kind) => Value::String(format!("[REDACTED:{kind}]")),
                None => value.clone(),
            },
            other => other.clone(),
        }
    }

    /// Redact a free-text string.
    pub fn redact_str(&self, text: &str) -> String {
        match self.detector.detect(text) {
            Some(kind) => format!("[REDACTED:{kind}]"),
            None => text.to_string(),
        }
    }
}
