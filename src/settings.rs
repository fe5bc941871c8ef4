use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::{CategorizerError, Result};
use crate::storage::{SettingsStorage, PAGE_SIZE_KEY, THEME_KEY};

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// The appearance actually applied once `System` is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    pub fn resolve(&self, prefers_dark: bool) -> Appearance {
        match self {
            Theme::Light => Appearance::Light,
            Theme::Dark => Appearance::Dark,
            Theme::System if prefers_dark => Appearance::Dark,
            Theme::System => Appearance::Light,
        }
    }

    /// Flips the currently applied appearance into an explicit theme.
    pub fn toggled(&self, prefers_dark: bool) -> Theme {
        match self.resolve(prefers_dark) {
            Appearance::Dark => Theme::Light,
            Appearance::Light => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(format!("unknown theme '{}', use light, dark or system", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub theme: Theme,
    pub page_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Reads a stored theme, falling back to the default for anything unrecognised.
pub fn theme_from_value(value: Option<&Value>) -> Theme {
    match value.and_then(|v| v.as_str()) {
        Some(s) => s.parse().unwrap_or_else(|e| {
            warn!("⚠️  {}, using system", e);
            Theme::default()
        }),
        None => Theme::default(),
    }
}

/// Reads a stored page size; missing, zero or non-integer values give the default.
pub fn page_size_from_value(value: Option<&Value>) -> usize {
    match value.and_then(|v| v.as_u64()) {
        Some(size) if size > 0 => size as usize,
        Some(_) => {
            warn!("⚠️  Page size must be positive, using {}", DEFAULT_PAGE_SIZE);
            DEFAULT_PAGE_SIZE
        }
        None => DEFAULT_PAGE_SIZE,
    }
}

pub fn validate_page_size(page_size: usize) -> Result<usize> {
    if page_size == 0 {
        return Err(CategorizerError::InvalidPageSize(page_size));
    }
    Ok(page_size)
}

impl Settings {
    pub async fn load<S: SettingsStorage + ?Sized>(storage: &S) -> Result<Self> {
        let stored = storage.get(&[THEME_KEY, PAGE_SIZE_KEY]).await?;
        Ok(Self {
            theme: theme_from_value(stored.get(THEME_KEY)),
            page_size: page_size_from_value(stored.get(PAGE_SIZE_KEY)),
        })
    }

    pub fn to_items(&self) -> Map<String, Value> {
        let mut items = Map::new();
        items.insert(THEME_KEY.to_string(), Value::from(self.theme.as_str()));
        items.insert(PAGE_SIZE_KEY.to_string(), Value::from(self.page_size));
        items
    }
}

pub async fn save_theme<S: SettingsStorage + ?Sized>(storage: &S, theme: Theme) -> Result<()> {
    let mut items = Map::new();
    items.insert(THEME_KEY.to_string(), Value::from(theme.as_str()));
    storage.set(items).await
}

pub async fn save_page_size<S: SettingsStorage + ?Sized>(storage: &S, page_size: usize) -> Result<()> {
    validate_page_size(page_size)?;
    let mut items = Map::new();
    items.insert(PAGE_SIZE_KEY.to_string(), Value::from(page_size));
    storage.set(items).await
}
