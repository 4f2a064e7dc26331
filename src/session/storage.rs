//! Persisted client-side key/value storage.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, instrument};

use crate::error::AdminResult;

/// Minimal string key/value store that survives restarts.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_item(&self, key: &str) -> AdminResult<Option<String>>;
    async fn set_item(&self, key: &str, value: &str) -> AdminResult<()>;
    async fn remove_item(&self, key: &str) -> AdminResult<()>;
}

/// Storage backed by a single JSON object on disk. A missing file reads as
/// empty; writes replace the whole file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> AdminResult<Map<String, Value>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Map::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, items: &Map<String, Value>) -> AdminResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(items)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl Storage for FileStorage {
    #[instrument(skip(self))]
    async fn get_item(&self, key: &str) -> AdminResult<Option<String>> {
        let items = self.read_all().await?;
        Ok(items.get(key).and_then(Value::as_str).map(str::to_string))
    }

    #[instrument(skip(self, value))]
    async fn set_item(&self, key: &str, value: &str) -> AdminResult<()> {
        let mut items = self.read_all().await?;
        items.insert(key.to_string(), Value::String(value.to_string()));
        self.write_all(&items).await?;
        debug!(path = %self.path.display(), "Item stored");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_item(&self, key: &str) -> AdminResult<()> {
        let mut items = self.read_all().await?;
        if items.remove(key).is_some() {
            self.write_all(&items).await?;
            debug!(path = %self.path.display(), "Item removed");
        }
        Ok(())
    }
}

/// Non-persistent storage, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_item(&self, key: &str) -> AdminResult<Option<String>> {
        Ok(self.items().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> AdminResult<()> {
        self.items().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> AdminResult<()> {
        self.items().remove(key);
        Ok(())
    }
}
