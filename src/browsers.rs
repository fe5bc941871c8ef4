use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{CategorizerError, Result};

/// A node of the host bookmark tree. Leaves carry a URL, folders carry children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub folder: bool,
    pub children: Vec<Bookmark>,
    pub date_added: Option<i64>,
    pub date_modified: Option<i64>,
}

impl Bookmark {
    pub fn leaf(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: Some(url.into()),
            folder: false,
            children: vec![],
            date_added: None,
            date_modified: None,
        }
    }

    pub fn folder(id: impl Into<String>, title: impl Into<String>, children: Vec<Bookmark>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: None,
            folder: true,
            children,
            date_added: None,
            date_modified: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        !self.folder && self.url.is_some()
    }
}

/// A browser view (tab) currently showing some URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenView {
    pub id: u64,
    pub url: String,
}

/// The host side of bookmark access: tree reads, removals and open views.
#[async_trait]
pub trait BookmarkProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the root folder of the bookmark tree.
    async fn get_tree(&self) -> Result<Bookmark>;

    async fn remove(&self, id: &str) -> Result<()>;

    /// Views currently showing `url`. Hosts without a notion of views return none.
    async fn open_views(&self, url: &str) -> Result<Vec<OpenView>>;

    async fn close_views(&self, view_ids: &[u64]) -> Result<()>;
}

// Chromium "Bookmarks" JSON file provider
pub struct ChromiumBookmarkProvider {
    path: PathBuf,
    write_lock: Mutex<()>,
}

const CHROMIUM_ROOT_ORDER: &[&str] = &["bookmark_bar", "other", "synced"];

impl ChromiumBookmarkProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Default location of the Chrome profile's bookmark file for this platform.
    pub fn detect_default_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| CategorizerError::Host("HOME is not set".to_string()))?;

        #[cfg(target_os = "macos")]
        let path = PathBuf::from(format!(
            "{}/Library/Application Support/Google/Chrome/Default/Bookmarks",
            home
        ));

        #[cfg(not(target_os = "macos"))]
        let path = PathBuf::from(format!("{}/.config/google-chrome/Default/Bookmarks", home));

        debug!("Default Chrome bookmarks path: {:?}", path);
        Ok(path)
    }

    async fn read_json(&self) -> Result<Value> {
        if !self.path.exists() {
            return Err(CategorizerError::Host(format!(
                "Bookmarks file not found: {:?}",
                self.path
            )));
        }
        let data = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Copies the bookmark file next to itself before it gets rewritten.
    pub async fn backup(&self) -> Result<PathBuf> {
        let backup_path = self.path.with_extension("json.backup");
        tokio::fs::copy(&self.path, &backup_path).await?;
        Ok(backup_path)
    }
}

#[async_trait]
impl BookmarkProvider for ChromiumBookmarkProvider {
    fn name(&self) -> &str {
        "Chromium"
    }

    async fn get_tree(&self) -> Result<Bookmark> {
        let json = self.read_json().await?;
        let root = parse_chromium_bookmarks(&json);
        debug!("Read bookmark tree with {} roots from {:?}", root.children.len(), self.path);
        Ok(root)
    }

    async fn remove(&self, id: &str) -> Result<()> {
        // removals are read-modify-write on one file; serialize them
        let _guard = self.write_lock.lock().await;

        let mut json = self.read_json().await?;
        let removed = match json.get_mut("roots").and_then(|v| v.as_object_mut()) {
            Some(roots) => {
                let mut removed = false;
                for root in roots.values_mut() {
                    if remove_chromium_node(root, id)? {
                        removed = true;
                        break;
                    }
                }
                removed
            }
            None => false,
        };

        if !removed {
            return Err(CategorizerError::BookmarkNotFound(id.to_string()));
        }

        self.backup().await?;
        // the stored checksum no longer matches; the browser recomputes it when absent
        if let Some(obj) = json.as_object_mut() {
            obj.remove("checksum");
        }
        let data = serde_json::to_string_pretty(&json)?;
        tokio::fs::write(&self.path, data).await?;

        debug!("Removed bookmark {} from {:?}", id, self.path);
        Ok(())
    }

    async fn open_views(&self, _url: &str) -> Result<Vec<OpenView>> {
        Ok(vec![])
    }

    async fn close_views(&self, view_ids: &[u64]) -> Result<()> {
        if !view_ids.is_empty() {
            warn!("⚠️  {} cannot close views from a bookmark file", self.name());
        }
        Ok(())
    }
}

// Helper functions for Chromium JSON parsing
fn parse_chromium_bookmarks(json: &Value) -> Bookmark {
    let mut children = Vec::new();

    if let Some(roots) = json.get("roots").and_then(|v| v.as_object()) {
        for key in CHROMIUM_ROOT_ORDER {
            if let Some(root) = roots.get(*key) {
                children.push(parse_chromium_node(root));
            }
        }
        for (key, root) in roots {
            if !CHROMIUM_ROOT_ORDER.contains(&key.as_str()) && root.is_object() {
                children.push(parse_chromium_node(root));
            }
        }
    }

    Bookmark::folder("0", "", children)
}

fn parse_chromium_node(node: &Value) -> Bookmark {
    let is_folder = node.get("type").and_then(|v| v.as_str()) == Some("folder")
        || node.get("children").is_some();

    let children = if is_folder {
        node.get("children")
            .and_then(|v| v.as_array())
            .map(|nodes| nodes.iter().map(parse_chromium_node).collect())
            .unwrap_or_default()
    } else {
        vec![]
    };

    Bookmark {
        id: node.get("id").and_then(|v| v.as_str()).unwrap_or("").to_string(),
        title: node.get("name").and_then(|v| v.as_str()).unwrap_or("").to_string(),
        url: if is_folder {
            None
        } else {
            node.get("url").and_then(|v| v.as_str()).map(|s| s.to_string())
        },
        folder: is_folder,
        children,
        date_added: parse_chromium_timestamp(node.get("date_added")),
        date_modified: parse_chromium_timestamp(node.get("date_modified")),
    }
}

// Chromium writes timestamps as decimal strings
fn parse_chromium_timestamp(value: Option<&Value>) -> Option<i64> {
    let value = value?;
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

fn remove_chromium_node(node: &mut Value, id: &str) -> Result<bool> {
    let Some(children) = node.get_mut("children").and_then(|v| v.as_array_mut()) else {
        return Ok(false);
    };

    if let Some(pos) = children
        .iter()
        .position(|child| child.get("id").and_then(|v| v.as_str()) == Some(id))
    {
        let non_empty_folder = children[pos]
            .get("children")
            .and_then(|v| v.as_array())
            .map(|c| !c.is_empty())
            .unwrap_or(false);
        if non_empty_folder {
            return Err(CategorizerError::Host(format!(
                "Can't remove non-empty folder {}",
                id
            )));
        }
        children.remove(pos);
        return Ok(true);
    }

    for child in children.iter_mut() {
        if remove_chromium_node(child, id)? {
            return Ok(true);
        }
    }
    Ok(false)
}
