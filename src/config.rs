//! Runtime configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::browsers::ChromiumBookmarkProvider;
use crate::notification::DEFAULT_NOTIFICATION_TTL;

pub const STORE_PATH_ENV: &str = "BOOKMARK_CATEGORIES_STORE";
pub const BOOKMARKS_PATH_ENV: &str = "BOOKMARK_CATEGORIES_BOOKMARKS";
pub const TOAST_MS_ENV: &str = "BOOKMARK_CATEGORIES_TOAST_MS";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// JSON file holding categories, the bookmark mapping and settings.
    pub store_path: PathBuf,
    /// Chromium `Bookmarks` file.
    pub bookmarks_path: PathBuf,
    pub notification_ttl: Duration,
}

/// Expand `~/` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

fn home_dir() -> Option<PathBuf> {
    env::var("HOME")
        .ok()
        .filter(|home| !home.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| env::var("USERPROFILE").ok().map(PathBuf::from))
}

fn parse_millis(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_millis)
}

impl AppConfig {
    pub fn from_env() -> Self {
        let store_path = env::var(STORE_PATH_ENV)
            .map(|p| expand_tilde(&p))
            .unwrap_or_else(|_| {
                home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".bookmark-categories.json")
            });

        let bookmarks_path = env::var(BOOKMARKS_PATH_ENV)
            .map(|p| expand_tilde(&p))
            .ok()
            .or_else(|| ChromiumBookmarkProvider::detect_default_path().ok())
            .unwrap_or_else(|| PathBuf::from("Bookmarks"));

        let notification_ttl = env::var(TOAST_MS_ENV)
            .ok()
            .and_then(|v| parse_millis(&v))
            .unwrap_or(DEFAULT_NOTIFICATION_TTL);

        Self {
            store_path,
            bookmarks_path,
            notification_ttl,
        }
    }

    /// CLI flags win over the environment.
    pub fn with_overrides(mut self, store: Option<&str>, bookmarks: Option<&str>) -> Self {
        if let Some(store) = store {
            self.store_path = expand_tilde(store);
        }
        if let Some(bookmarks) = bookmarks {
            self.bookmarks_path = expand_tilde(bookmarks);
        }
        self
    }
}
