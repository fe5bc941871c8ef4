//! 分类存储
//!
//! Holds the ordered category list and the bookmark id -> category mapping.
//! Every mutation reads both blobs from storage, edits them and writes whole
//! values back, so the latest writer wins.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::storage::{SettingsStorage, BOOKMARK_CATEGORIES_KEY, CATEGORIES_KEY};

/// Seed list used when nothing has been stored yet.
pub const DEFAULT_CATEGORIES: &[&str] = &["常用", "工作", "学习", "娱乐", "其他"];

/// Bookmark id -> category name.
pub type BookmarkCategories = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryData {
    pub categories: Vec<String>,
    pub bookmark_categories: BookmarkCategories,
}

pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

fn decode_categories(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(value) => match serde_json::from_value(value.clone()) {
            Ok(categories) => categories,
            Err(e) => {
                warn!("⚠️  Stored categories are unreadable, using defaults: {}", e);
                default_categories()
            }
        },
        None => default_categories(),
    }
}

fn decode_mapping(value: Option<&Value>) -> BookmarkCategories {
    match value {
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            warn!("⚠️  Stored bookmark categories are unreadable, starting empty: {}", e);
            BookmarkCategories::new()
        }),
        None => BookmarkCategories::new(),
    }
}

pub struct CategoryStore<'a, S: SettingsStorage + ?Sized> {
    storage: &'a S,
}

impl<'a, S: SettingsStorage + ?Sized> CategoryStore<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    pub async fn load(&self) -> Result<CategoryData> {
        let stored = self
            .storage
            .get(&[CATEGORIES_KEY, BOOKMARK_CATEGORIES_KEY])
            .await?;
        Ok(CategoryData {
            categories: decode_categories(stored.get(CATEGORIES_KEY)),
            bookmark_categories: decode_mapping(stored.get(BOOKMARK_CATEGORIES_KEY)),
        })
    }

    pub async fn load_categories(&self) -> Result<Vec<String>> {
        let stored = self.storage.get(&[CATEGORIES_KEY]).await?;
        Ok(decode_categories(stored.get(CATEGORIES_KEY)))
    }

    pub async fn load_mapping(&self) -> Result<BookmarkCategories> {
        let stored = self.storage.get(&[BOOKMARK_CATEGORIES_KEY]).await?;
        Ok(decode_mapping(stored.get(BOOKMARK_CATEGORIES_KEY)))
    }

    async fn save_categories(&self, categories: &[String]) -> Result<()> {
        let mut items = Map::new();
        items.insert(CATEGORIES_KEY.to_string(), serde_json::to_value(categories)?);
        self.storage.set(items).await
    }

    pub async fn save_mapping(&self, mapping: &BookmarkCategories) -> Result<()> {
        let mut items = Map::new();
        items.insert(BOOKMARK_CATEGORIES_KEY.to_string(), serde_json::to_value(mapping)?);
        self.storage.set(items).await
    }

    /// Writes both blobs in one storage call.
    pub async fn save(&self, data: &CategoryData) -> Result<()> {
        let mut items = Map::new();
        items.insert(CATEGORIES_KEY.to_string(), serde_json::to_value(&data.categories)?);
        items.insert(
            BOOKMARK_CATEGORIES_KEY.to_string(),
            serde_json::to_value(&data.bookmark_categories)?,
        );
        self.storage.set(items).await
    }

    /// Appends `name` unless it is already present. Returns whether anything changed.
    pub async fn add_category(&self, name: &str) -> Result<bool> {
        let mut categories = self.load_categories().await?;
        if categories.iter().any(|c| c == name) {
            debug!("Category {:?} already exists", name);
            return Ok(false);
        }
        categories.push(name.to_string());
        self.save_categories(&categories).await?;
        info!("➕ Added category {:?}", name);
        Ok(true)
    }

    /// Renames in place and relabels every bookmark carrying `old`.
    pub async fn rename_category(&self, old: &str, new: &str) -> Result<bool> {
        if new.is_empty() || old == new {
            return Ok(false);
        }
        let mut data = self.load().await?;
        let Some(index) = data.categories.iter().position(|c| c == old) else {
            debug!("Category {:?} not found, nothing to rename", old);
            return Ok(false);
        };
        data.categories[index] = new.to_string();

        let mut relabeled = 0;
        for category in data.bookmark_categories.values_mut() {
            if category == old {
                *category = new.to_string();
                relabeled += 1;
            }
        }

        self.save(&data).await?;
        info!("✏️  Renamed category {:?} -> {:?} ({} bookmarks)", old, new, relabeled);
        Ok(true)
    }

    /// Removes the category and drops (not reassigns) every mapping entry pointing at it.
    pub async fn delete_category(&self, name: &str) -> Result<bool> {
        let mut data = self.load().await?;
        let before_categories = data.categories.len();
        let before_mapping = data.bookmark_categories.len();

        data.categories.retain(|c| c != name);
        data.bookmark_categories.retain(|_, category| category != name);

        let cleared = before_mapping - data.bookmark_categories.len();
        if data.categories.len() == before_categories && cleared == 0 {
            return Ok(false);
        }

        self.save(&data).await?;
        info!("🗑️  Deleted category {:?} ({} bookmarks uncategorized)", name, cleared);
        Ok(true)
    }

    /// Sets a bookmark's category. The name is not checked against the category list.
    pub async fn assign(&self, bookmark_id: &str, category: &str) -> Result<()> {
        let mut mapping = self.load_mapping().await?;
        mapping.insert(bookmark_id.to_string(), category.to_string());
        self.save_mapping(&mapping).await?;
        debug!("Assigned bookmark {} to {:?}", bookmark_id, category);
        Ok(())
    }

    pub async fn assign_many<'i, I>(&self, bookmark_ids: I, category: &str) -> Result<usize>
    where
        I: IntoIterator<Item = &'i String> + Send,
        I::IntoIter: Send,
    {
        let mut mapping = self.load_mapping().await?;
        let mut count = 0;
        for id in bookmark_ids {
            mapping.insert(id.clone(), category.to_string());
            count += 1;
        }
        self.save_mapping(&mapping).await?;
        Ok(count)
    }

    /// Drops the mapping entries of `bookmark_ids`.
    pub async fn forget<'i, I>(&self, bookmark_ids: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'i String> + Send,
        I::IntoIter: Send,
    {
        let mut mapping = self.load_mapping().await?;
        let mut removed = 0;
        for id in bookmark_ids {
            if mapping.remove(id).is_some() {
                removed += 1;
            }
        }
        self.save_mapping(&mapping).await?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStorage;
    use serde_json::json;

    fn storage_with(categories: &[&str], mapping: &[(&str, &str)]) -> MemoryStorage {
        let mut values = Map::new();
        values.insert(CATEGORIES_KEY.into(), json!(categories));
        let mapping: Map<String, Value> = mapping
            .iter()
            .map(|(id, c)| (id.to_string(), Value::from(*c)))
            .collect();
        values.insert(BOOKMARK_CATEGORIES_KEY.into(), Value::Object(mapping));
        MemoryStorage::with_values(values)
    }

    #[tokio::test]
    async fn test_load_seeds_defaults() {
        let storage = MemoryStorage::new();
        let data = CategoryStore::new(&storage).load().await.unwrap();
        assert_eq!(data.categories, default_categories());
        assert!(data.bookmark_categories.is_empty());
    }

    #[tokio::test]
    async fn test_add_appends_and_ignores_duplicates() {
        let storage = storage_with(&["Work"], &[]);
        let store = CategoryStore::new(&storage);
        assert!(store.add_category("Study").await.unwrap());
        assert!(!store.add_category("Work").await.unwrap());
        assert_eq!(store.load_categories().await.unwrap(), vec!["Work", "Study"]);
    }

    #[tokio::test]
    async fn test_rename_keeps_position_and_relabels() {
        let storage = storage_with(&["A", "Work", "C"], &[("b1", "Work"), ("b2", "C")]);
        let store = CategoryStore::new(&storage);
        assert!(store.rename_category("Work", "Job").await.unwrap());

        let data = store.load().await.unwrap();
        assert_eq!(data.categories, vec!["A", "Job", "C"]);
        assert_eq!(data.bookmark_categories["b1"], "Job");
        assert_eq!(data.bookmark_categories["b2"], "C");
    }

    #[tokio::test]
    async fn test_rename_unknown_or_unchanged_is_noop() {
        let storage = storage_with(&["Work"], &[("b1", "Work")]);
        let store = CategoryStore::new(&storage);
        assert!(!store.rename_category("Missing", "X").await.unwrap());
        assert!(!store.rename_category("Work", "Work").await.unwrap());
        assert!(!store.rename_category("Work", "").await.unwrap());
        assert_eq!(store.load_categories().await.unwrap(), vec!["Work"]);
    }

    #[tokio::test]
    async fn test_delete_drops_mapping_entries() {
        let storage = storage_with(&["Work", "Other"], &[("b1", "Work"), ("b2", "Other")]);
        let store = CategoryStore::new(&storage);
        assert!(store.delete_category("Work").await.unwrap());

        let data = store.load().await.unwrap();
        assert_eq!(data.categories, vec!["Other"]);
        assert!(!data.bookmark_categories.contains_key("b1"));
        assert_eq!(data.bookmark_categories["b2"], "Other");
    }

    #[tokio::test]
    async fn test_delete_clears_dangling_labels() {
        let storage = storage_with(&["Other"], &[("b1", "Gone")]);
        let store = CategoryStore::new(&storage);
        assert!(store.delete_category("Gone").await.unwrap());
        assert!(store.load_mapping().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_assign_accepts_unknown_category() {
        let storage = storage_with(&["Work"], &[]);
        let store = CategoryStore::new(&storage);
        store.assign("b9", "Not a category").await.unwrap();
        assert_eq!(store.load_mapping().await.unwrap()["b9"], "Not a category");
    }
}
