//! Persistence configuration
//!
//! Configuration arrives as the bluesky-style nested JSON object carried in a
//! fire information document (`{"dispersion": {"start": ..., "num_hours": ...}}`).
//! [`ConfigLayers`] stacks that base with extra config documents and
//! `section.key=value` overrides, then [`ConfigLayers::resolve`] extracts the
//! typed [`PersistenceConfig`]. Unknown sections and keys are ignored so the
//! same object can feed other pipeline stages.

use crate::error::ConfigError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Optional overrides for the dispersion window.
///
/// `None` means "derive from the fire population"; `Some(0)` hours is an
/// explicit value and is kept as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispersionOverrides {
    pub start: Option<NaiveDateTime>,
    pub num_hours: Option<u32>,
}

impl DispersionOverrides {
    pub fn new(start: Option<NaiveDateTime>, num_hours: Option<u32>) -> Self {
        Self { start, num_hours }
    }
}

/// Options for the persistence stage itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceOptions {
    /// Drop fires and activity that lie entirely outside the dispersion window
    /// after persisting. Off unless explicitly enabled.
    pub prune_unused_fires: bool,
}

/// Typed view of the sections the persistence stage reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub dispersion: DispersionOverrides,
    pub persistence: PersistenceOptions,
}

impl PersistenceConfig {
    /// Extract the persistence sections from a nested config object.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] if a known key holds a value of the wrong type.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(Self::deserialize(value)?)
    }
}

/// Layered configuration object.
///
/// Later layers win. Objects are merged key by key, any other value replaces
/// what was there.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigLayers {
    root: Map<String, Value>,
}

impl ConfigLayers {
    /// Start from a base config object; anything but an object starts empty
    pub fn new(base: Value) -> Self {
        match base {
            Value::Object(root) => Self { root },
            _ => Self::default(),
        }
    }

    /// Deep-merge `overlay` on top of the current layers
    pub fn merge(&mut self, overlay: Value) {
        if let Value::Object(overlay) = overlay {
            merge_objects(&mut self.root, overlay);
        }
    }

    /// Merge a config document.
    ///
    /// Documents of the form `{"config": {...}}` contribute their `config`
    /// object; anything else is treated as a bare config object.
    pub fn merge_document(&mut self, mut document: Value) {
        let overlay = match document.get_mut("config") {
            Some(config) => config.take(),
            None => document,
        };
        self.merge(overlay);
    }

    /// Set the value at a dotted `section.key` path, creating objects as needed
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidOverride`] for an empty path or path segment.
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), ConfigError> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::InvalidOverride(path.to_owned()));
        }
        let Some((last, parents)) = segments.split_last() else {
            return Err(ConfigError::InvalidOverride(path.to_owned()));
        };

        let mut node = &mut self.root;
        for segment in parents {
            let child = node
                .entry((*segment).to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            node = child
                .as_object_mut()
                .ok_or_else(|| ConfigError::InvalidOverride(path.to_owned()))?;
        }
        node.insert((*last).to_owned(), value);
        Ok(())
    }

    /// Apply a `section.key=value` override.
    ///
    /// The value is parsed as JSON when it parses (`48`, `true`, `{"a":1}`),
    /// otherwise it is stored as a string (`2020-06-01T00:00:00`).
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidOverride`] if there is no `=` or the key is empty.
    pub fn apply_override(&mut self, assignment: &str) -> Result<(), ConfigError> {
        let (path, raw) = assignment
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidOverride(assignment.to_owned()))?;
        let value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()));
        self.set(path.trim(), value)
            .map_err(|_| ConfigError::InvalidOverride(assignment.to_owned()))
    }

    pub fn value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    /// Typed persistence configuration of the merged layers
    ///
    /// # Errors
    /// See [`PersistenceConfig::from_value`].
    pub fn resolve(&self) -> Result<PersistenceConfig, ConfigError> {
        PersistenceConfig::from_value(&self.value())
    }
}

fn merge_objects(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        let value = match (base.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_objects(existing, incoming);
                continue;
            }
            (_, value) => value,
        };
        base.insert(key, value);
    }
}
