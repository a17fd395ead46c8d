//! Namespaced stack settings.
//!
//! Settings are flat `namespace:key` string pairs, e.g. `bucket-service:bucketName`
//! or `aws:region`. They can be loaded from a JSON document and then overlaid
//! with environment variables; typed accessors interpret the raw strings.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde_json::Value;
use tracing::debug;

use crate::error::{StackError, StackResult};

/// A flat, namespaced key-value settings bag.
///
/// # Examples
///
/// ```
/// use bucketstack_core::Settings;
///
/// let settings = Settings::from_json_str(r#"{"aws:region": "eu-west-1"}"#).unwrap();
/// assert_eq!(settings.get("aws", "region"), Some("eu-west-1"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    /// Create an empty settings bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from a JSON object of `"namespace:key"` to scalar values.
    ///
    /// Strings, booleans, and integers are accepted; `null` entries are skipped.
    pub fn from_json_str(json: &str) -> StackResult<Self> {
        let doc: BTreeMap<String, Value> = serde_json::from_str(json)
            .map_err(|e| StackError::Config(format!("settings must be a JSON object: {e}")))?;

        let mut settings = Self::new();
        for (key, value) in doc {
            let raw = match value {
                Value::Null => continue,
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
                other => {
                    return Err(StackError::InvalidConfig {
                        key,
                        value: other.to_string(),
                        reason: "expected a string, boolean, or integer".to_owned(),
                    });
                }
            };
            if !key.contains(':') {
                return Err(StackError::InvalidConfig {
                    key,
                    value: raw,
                    reason: "setting keys must be namespaced as 'namespace:key'".to_owned(),
                });
            }
            settings.values.insert(key, raw);
        }
        Ok(settings)
    }

    /// Load settings from a JSON file.
    pub fn from_file(path: &Path) -> StackResult<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::from_json_str(&content)
    }

    /// Set a value, replacing any previous one.
    pub fn set(&mut self, namespace: &str, key: &str, value: impl Into<String>) {
        self.values.insert(qualify(namespace, key), value.into());
    }

    /// Overlay values from `lookup` for each `(key, variable)` binding.
    pub fn overlay<F>(&mut self, namespace: &str, bindings: &[(&str, &str)], lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for (key, variable) in bindings {
            if let Some(value) = lookup(variable) {
                debug!(namespace, key, variable, "setting overridden");
                self.set(namespace, key, value);
            }
        }
    }

    /// Overlay values from environment variables.
    pub fn overlay_env(&mut self, namespace: &str, bindings: &[(&str, &str)]) {
        self.overlay(namespace, bindings, |var| std::env::var(var).ok());
    }

    /// Get a raw value. Empty strings are treated as absent.
    #[must_use]
    pub fn get(&self, namespace: &str, key: &str) -> Option<&str> {
        self.values
            .get(&qualify(namespace, key))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Get a value that must be present.
    pub fn require(&self, namespace: &str, key: &str) -> StackResult<&str> {
        self.get(namespace, key)
            .ok_or_else(|| StackError::MissingConfig {
                key: qualify(namespace, key),
            })
    }

    /// Get a boolean, accepting `true`/`false`/`1`/`0` (case-insensitive).
    pub fn get_bool(&self, namespace: &str, key: &str) -> StackResult<Option<bool>> {
        let Some(raw) = self.get(namespace, key) else {
            return Ok(None);
        };
        match raw {
            "1" => Ok(Some(true)),
            "0" => Ok(Some(false)),
            v if v.eq_ignore_ascii_case("true") => Ok(Some(true)),
            v if v.eq_ignore_ascii_case("false") => Ok(Some(false)),
            v => Err(StackError::InvalidConfig {
                key: qualify(namespace, key),
                value: v.to_owned(),
                reason: "expected a boolean".to_owned(),
            }),
        }
    }

    /// Get a 32-bit integer.
    pub fn get_int(&self, namespace: &str, key: &str) -> StackResult<Option<i32>> {
        let Some(raw) = self.get(namespace, key) else {
            return Ok(None);
        };
        raw.trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|e| StackError::InvalidConfig {
                key: qualify(namespace, key),
                value: raw.to_owned(),
                reason: e.to_string(),
            })
    }

    /// Number of stored settings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no settings are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn qualify(namespace: &str, key: &str) -> String {
    format!("{namespace}:{key}")
}
