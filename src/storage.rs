//! Host key-value persistence.
//!
//! Values are stored whole under top-level keys: a `set` replaces each given key's
//! value entirely and leaves other keys untouched. Nothing merges inside a value,
//! so two overlapping read-modify-write sequences resolve as last writer wins.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{CategorizerError, Result};

pub const CATEGORIES_KEY: &str = "categories";
pub const BOOKMARK_CATEGORIES_KEY: &str = "bookmarkCategories";
pub const THEME_KEY: &str = "theme";
pub const PAGE_SIZE_KEY: &str = "pageSize";

#[async_trait]
pub trait SettingsStorage: Send + Sync {
    /// Returns the stored values for `keys`. Missing keys are absent from the map.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;

    async fn set(&self, items: Map<String, Value>) -> Result<()>;
}

/// Storage backed by a single JSON object on disk.
pub struct JsonFileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(CategorizerError::Storage(format!(
                "{:?} does not contain a JSON object",
                self.path
            ))),
        }
    }
}

#[async_trait]
impl SettingsStorage for JsonFileStorage {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let stored = self.load().await?;
        Ok(keys
            .iter()
            .filter_map(|key| stored.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut stored = self.load().await?;
        let keys: Vec<String> = items.keys().cloned().collect();
        stored.extend(items);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(&Value::Object(stored))?;
        tokio::fs::write(&self.path, content).await?;

        debug!("Stored keys {:?} in {:?}", keys, self.path);
        Ok(())
    }
}
