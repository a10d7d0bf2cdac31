//! Summary cache.
//!
//! Generated summaries are stored in the key-value store under the
//! `summaryCache` field, a JSON object mapping [`cache_key`] to HTML text.
//! The cache is unbounded and has no per-entry expiry.
//!
//! # Invalidation
//!
//! Entries are not tagged with the model that produced them beyond the key
//! itself. When the selected model changes the whole object is replaced
//! with `{}` ([`SummaryCache::invalidate_all`]). This is coarser than
//! necessary (entries for other models would still be valid) but keeps the
//! stored shape trivial.
//!
//! # Concurrency
//!
//! [`SummaryCache::store`] is a read-modify-write over the shared store.
//! A concurrent invalidation may be lost or may clobber a fresh entry;
//! last write wins.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::warn;

use crate::Result;
use crate::store::{KeyValueStore, keys};
use crate::telemetry;

/// Separator between the URL and model parts of a cache key.
///
/// Model identifiers never contain it and `normalize_url` is applied to the
/// URL part, so keys cannot collide across different (url, model) pairs
/// unless the URL itself ends in `|<model>`.
pub const KEY_SEPARATOR: char = '|';

/// Derive the cache key for a page and model.
///
/// Pure and deterministic: same inputs give the same key across restarts.
pub fn cache_key(url: &str, model_id: &str) -> String {
    format!("{}{KEY_SEPARATOR}{model_id}", normalize_url(url))
}

/// Normalise a page URL for keying: trim whitespace and drop any fragment.
pub fn normalize_url(url: &str) -> &str {
    let url = url.trim();
    match url.find('#') {
        Some(idx) => &url[..idx],
        None => url,
    }
}

/// Store-backed cache of generated summaries.
#[derive(Clone)]
pub struct SummaryCache {
    backend: Arc<dyn KeyValueStore>,
}

impl SummaryCache {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Look up a cached summary.
    ///
    /// Never fails: unreadable or malformed cache state counts as a miss.
    /// Emits cache hit/miss metrics.
    pub async fn lookup(&self, key: &str) -> Option<String> {
        let hit = match self.entries().await {
            Ok(mut entries) => match entries.remove(key) {
                Some(Value::String(text)) => Some(text),
                _ => None,
            },
            Err(e) => {
                warn!(error = %e, "summary cache unreadable, treating as miss");
                None
            }
        };

        if hit.is_some() {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "operation" => "summarize")
                .increment(1);
        } else {
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "operation" => "summarize")
                .increment(1);
        }
        hit
    }

    /// Insert (or overwrite) the entry for `key`.
    ///
    /// Exactly one store write. If the current cache cannot be read nothing
    /// is written, so other entries are never lost.
    pub async fn store(&self, key: &str, text: &str) -> Result<()> {
        let mut entries = self.entries().await?;
        entries.insert(key.to_string(), Value::String(text.to_string()));

        let mut items = Map::new();
        items.insert(keys::SUMMARY_CACHE.to_string(), Value::Object(entries));
        self.backend.set(items).await
    }

    /// Drop every entry.
    pub async fn invalidate_all(&self) -> Result<()> {
        let mut items = Map::new();
        items.insert(keys::SUMMARY_CACHE.to_string(), Value::Object(Map::new()));
        self.backend.set(items).await
    }

    /// Number of cached entries.
    pub async fn len(&self) -> Result<usize> {
        Ok(self.entries().await?.len())
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    async fn entries(&self) -> Result<Map<String, Value>> {
        let mut values = self.backend.get(&[keys::SUMMARY_CACHE]).await?;
        match values.remove(keys::SUMMARY_CACHE) {
            Some(Value::Object(entries)) => Ok(entries),
            None | Some(Value::Null) => Ok(Map::new()),
            Some(other) => {
                warn!(kind = ?other, "summaryCache is not an object, ignoring it");
                Ok(Map::new())
            }
        }
    }
}
