//! Key-value store adapter.
//!
//! The store is the only persistent state: credentials, the selected model,
//! the summary cache and the last exchange all live in one flat namespace of
//! JSON values. Any context may read or write it at any time; writes are
//! last-write-wins with no transactional guarantee.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: process-local, backed by a concurrent map.
//! - [`FileStore`]: a single JSON document on disk, written atomically.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::Result;

/// Field names shared by every context that touches the store.
pub mod keys {
    pub const ANTHROPIC_API_KEY: &str = "anthropicApiKey";
    pub const OPENAI_API_KEY: &str = "openaiApiKey";
    pub const SELECTED_MODEL: &str = "selectedModel";
    pub const SUMMARY_CACHE: &str = "summaryCache";
    pub const LAST_RESULT: &str = "lastResult";
    pub const LAST_QUESTION: &str = "lastQuestion";
}

/// Async get/set over string keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the requested keys. Missing keys are simply absent from the map.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;

    /// Write every entry of `items`, overwriting existing values.
    async fn set(&self, items: Map<String, Value>) -> Result<()>;

    /// Fetch a single string value.
    ///
    /// Non-string values are treated as absent.
    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let mut values = self.get(&[key]).await?;
        Ok(match values.remove(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        })
    }
}
