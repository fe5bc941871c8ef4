//! In-process host implementations for tests and embedding.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::browsers::{Bookmark, BookmarkProvider, OpenView};
use crate::error::{CategorizerError, Result};
use crate::storage::SettingsStorage;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct MemoryBookmarkProvider {
    tree: Mutex<Bookmark>,
    views: Mutex<Vec<OpenView>>,
    failing_ids: Mutex<HashSet<String>>,
    fail_view_close: AtomicBool,
}

impl MemoryBookmarkProvider {
    pub fn new(root: Bookmark) -> Self {
        Self {
            tree: Mutex::new(root),
            views: Mutex::new(Vec::new()),
            failing_ids: Mutex::new(HashSet::new()),
            fail_view_close: AtomicBool::new(false),
        }
    }

    pub fn with_views(self, views: Vec<OpenView>) -> Self {
        *lock(&self.views) = views;
        self
    }

    /// Makes every later `remove(id)` fail with a host error.
    pub fn fail_removal_of(&self, id: &str) {
        lock(&self.failing_ids).insert(id.to_string());
    }

    pub fn fail_view_close(&self, fail: bool) {
        self.fail_view_close.store(fail, Ordering::SeqCst);
    }

    pub fn tree(&self) -> Bookmark {
        lock(&self.tree).clone()
    }

    pub fn views(&self) -> Vec<OpenView> {
        lock(&self.views).clone()
    }
}

fn remove_node(node: &mut Bookmark, id: &str) -> Option<Bookmark> {
    if let Some(pos) = node.children.iter().position(|c| c.id == id) {
        return Some(node.children.remove(pos));
    }
    node.children.iter_mut().find_map(|child| remove_node(child, id))
}

#[async_trait]
impl BookmarkProvider for MemoryBookmarkProvider {
    fn name(&self) -> &str {
        "Memory"
    }

    async fn get_tree(&self) -> Result<Bookmark> {
        Ok(self.tree())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        if lock(&self.failing_ids).contains(id) {
            return Err(CategorizerError::Host(format!("Can't remove bookmark {}", id)));
        }
        match remove_node(&mut lock(&self.tree), id) {
            Some(_) => Ok(()),
            None => Err(CategorizerError::BookmarkNotFound(id.to_string())),
        }
    }

    async fn open_views(&self, url: &str) -> Result<Vec<OpenView>> {
        Ok(lock(&self.views)
            .iter()
            .filter(|view| view.url == url)
            .cloned()
            .collect())
    }

    async fn close_views(&self, view_ids: &[u64]) -> Result<()> {
        if self.fail_view_close.load(Ordering::SeqCst) {
            return Err(CategorizerError::Host("Can't close views".to_string()));
        }
        lock(&self.views).retain(|view| !view_ids.contains(&view.id));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<Map<String, Value>>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: Map<String, Value>) -> Self {
        Self {
            values: Mutex::new(values),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        lock(&self.values).clone()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SettingsStorage for MemoryStorage {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let values = lock(&self.values);
        Ok(keys
            .iter()
            .filter_map(|key| values.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CategorizerError::Storage("quota exceeded".to_string()));
        }
        lock(&self.values).extend(items);
        Ok(())
    }
}
