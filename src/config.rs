//! Game tuning values
//!
//! A read-only blackboard of named values loaded once by the host (from JSON
//! or assembled programmatically). Every lookup carries a default, so the
//! simulation never depends on a key being present.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

/// Named tuning values with per-key defaults. Cheap to clone and share.
#[derive(Debug, Clone, Default)]
pub struct GameConfig {
    values: Arc<HashMap<String, Value>>,
}

impl GameConfig {
    /// Build a config from a parsed JSON object. Non-object values yield an
    /// empty config (all lookups fall back to their defaults).
    pub fn from_json(json: Value) -> Self {
        let values = match json {
            Value::Object(map) => map.into_iter().collect(),
            _ => HashMap::new(),
        };
        Self {
            values: Arc::new(values),
        }
    }

    /// Build a config from explicit key/value pairs. Mostly used by tests.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
        let values = pairs
            .into_iter()
            .map(|(key, value)| (key.to_owned(), value))
            .collect();
        Self {
            values: Arc::new(values),
        }
    }

    pub fn get_f32(&self, key: &str, default: f32) -> f32 {
        self.values
            .get(key)
            .and_then(Value::as_f64)
            .map(|v| v as f32)
            .unwrap_or(default)
    }

    pub fn get_i32(&self, key: &str, default: i32) -> i32 {
        self.values
            .get(key)
            .and_then(Value::as_i64)
            .map(|v| v as i32)
            .unwrap_or(default)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_owned()
    }
}
