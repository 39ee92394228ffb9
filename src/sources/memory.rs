//! In-memory property source.

use super::{PropertySource, RawProperties};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct MemoryState {
    properties: RawProperties,
    failure_status: Option<u16>,
}

/// In-memory property source.
///
/// Holds a mutable map that is copied out on every fetch. Clones share the
/// same state, so one handle can be given to the engine while another is
/// used to change properties or simulate an outage.
///
/// # Examples
///
/// ```rust
/// use polling_config::sources::MemorySource;
///
/// let source = MemorySource::new("overrides");
/// source.set("feature.enabled", "true");
/// source.fail_with_status(Some(503));
/// ```
#[derive(Clone)]
pub struct MemorySource {
    name: String,
    state: Arc<RwLock<MemoryState>>,
}

impl MemorySource {
    /// Create an empty in-memory source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(RwLock::new(MemoryState::default())),
        }
    }

    /// Create a source pre-populated with string properties.
    pub fn with_properties<K, V>(name: impl Into<String>, properties: HashMap<K, V>) -> Self
    where
        K: Into<String>,
        V: Into<config::ValueKind>,
    {
        let source = Self::new(name);
        for (key, value) in properties {
            source.set(key, value);
        }
        source
    }

    /// Set a property.
    pub fn set(&self, key: impl Into<String>, value: impl Into<config::ValueKind>) {
        let value = config::Value::new(Some(&self.name), value);
        self.state.write().properties.insert(key.into(), value);
    }

    /// Remove a property, returning whether it was present.
    pub fn remove(&self, key: &str) -> bool {
        self.state.write().properties.remove(key).is_some()
    }

    /// Remove all properties.
    pub fn clear(&self) {
        self.state.write().properties.clear();
    }

    /// Number of properties currently held.
    pub fn len(&self) -> usize {
        self.state.read().properties.len()
    }

    /// Check whether the source holds no properties.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make subsequent fetches fail with the given status, or succeed again with `None`.
    pub fn fail_with_status(&self, status: Option<u16>) {
        self.state.write().failure_status = status;
    }
}

#[async_trait]
impl PropertySource for MemorySource {
    async fn fetch(&self) -> Result<RawProperties> {
        let state = self.state.read();
        if let Some(status) = state.failure_status {
            return Err(ConfigError::Status {
                endpoint: self.name(),
                status,
            });
        }
        Ok(state.properties.clone())
    }

    fn name(&self) -> String {
        format!("memory:{}", self.name)
    }
}
