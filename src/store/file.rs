//! On-disk key-value store.
//!
//! The whole namespace is one JSON object. Reads parse the file; writes
//! merge into the current document and replace the file atomically
//! (tmp + rename), so a crash never leaves a half-written store behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use super::KeyValueStore;
use crate::{ColloquyError, Result};

/// JSON-file-backed store.
///
/// Read-modify-write cycles are serialised within the process. Writers in
/// other processes are not coordinated; the last rename wins.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (lazily) the store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Default location: `<data dir>/colloquy/storage.json`.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join("colloquy")
            .join("storage.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Map<String, Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(ColloquyError::Storage(format!(
                    "failed to read store {}: {e}",
                    self.path.display()
                )));
            }
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ColloquyError::Storage(format!(
                "store {} is not a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(ColloquyError::Storage(format!(
                "corrupt store {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn write_document(&self, document: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ColloquyError::Storage(format!(
                    "failed to create store dir {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(document)?;
        tokio::fs::write(&tmp_path, json).await.map_err(|e| {
            ColloquyError::Storage(format!(
                "failed to write store file {}: {e}",
                tmp_path.display()
            ))
        })?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| {
                ColloquyError::Storage(format!(
                    "failed to rename store file {} → {}: {e}",
                    tmp_path.display(),
                    self.path.display()
                ))
            })?;

        debug!(path = %self.path.display(), keys = document.len(), "store written");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let mut document = self.read_document().await?;
        let mut out = Map::new();
        for key in keys {
            if let Some(value) = document.remove(*key) {
                out.insert((*key).to_string(), value);
            }
        }
        Ok(out)
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        for (key, value) in items {
            document.insert(key, value);
        }
        self.write_document(&document).await
    }
}
