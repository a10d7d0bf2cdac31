//! In-memory key-value store.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::KeyValueStore;
use crate::Result;

/// Process-local store backed by an unbounded moka map.
///
/// Contents vanish with the process. Used by tests and by callers that
/// bring their own persistence.
pub struct MemoryStore {
    entries: moka::sync::Cache<String, Value>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: moka::sync::Cache::builder().build(),
        }
    }

    /// Create a store pre-populated with `items`.
    pub fn with_entries(items: Map<String, Value>) -> Self {
        let store = Self::new();
        for (key, value) in items {
            store.entries.insert(key, value);
        }
        store
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        for key in keys {
            if let Some(value) = self.entries.get(*key) {
                out.insert((*key).to_string(), value);
            }
        }
        Ok(out)
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        for (key, value) in items {
            self.entries.insert(key, value);
        }
        Ok(())
    }
}
