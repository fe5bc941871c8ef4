//! JSON import/export of the category data and settings.
//!
//! Document shape:
//! `{ "version": "1.0", "exportDate": <ISO-8601>, "data": { "categories": [...],
//!    "bookmarkCategories": {...}, "settings": { "theme": ..., "pageSize": ... } } }`

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::category_store::{BookmarkCategories, CategoryData};
use crate::error::{CategorizerError, Result};
use crate::settings::{page_size_from_value, theme_from_value, Settings};
use crate::storage::{BOOKMARK_CATEGORIES_KEY, CATEGORIES_KEY};

pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: String,
    pub export_date: String,
    pub data: ExportData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub categories: Vec<String>,
    pub bookmark_categories: BookmarkCategories,
    pub settings: Settings,
}

impl ExportDocument {
    pub fn new(data: &CategoryData, settings: Settings, now: DateTime<Utc>) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            export_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            data: ExportData {
                categories: data.categories.clone(),
                bookmark_categories: data.bookmark_categories.clone(),
                settings,
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// `bookmark-categories-<YYYY-MM-DD>.json`
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("bookmark-categories-{}.json", now.format("%Y-%m-%d"))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Shape check run before anything from an import is applied.
pub fn validate_document(document: &Value) -> bool {
    if !document.is_object() {
        return false;
    }
    if !document.get("version").map(is_truthy).unwrap_or(false) {
        return false;
    }
    let Some(data) = document.get("data").filter(|d| is_truthy(d)) else {
        return false;
    };
    data.get("categories").map(Value::is_array).unwrap_or(false)
        && data.get(BOOKMARK_CATEGORIES_KEY).map(Value::is_object).unwrap_or(false)
}

/// Everything an import overwrites.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportData {
    pub categories: Vec<String>,
    pub bookmark_categories: BookmarkCategories,
    pub settings: Settings,
}

impl ImportData {
    pub fn category_data(&self) -> CategoryData {
        CategoryData {
            categories: self.categories.clone(),
            bookmark_categories: self.bookmark_categories.clone(),
        }
    }

    /// All four keys, ready for a single storage write.
    pub fn to_items(&self) -> Result<Map<String, Value>> {
        let mut items = self.settings.to_items();
        items.insert(CATEGORIES_KEY.to_string(), serde_json::to_value(&self.categories)?);
        items.insert(
            BOOKMARK_CATEGORIES_KEY.to_string(),
            serde_json::to_value(&self.bookmark_categories)?,
        );
        Ok(items)
    }
}

/// Parses and validates an export document. Malformed JSON and a bad shape both fail.
pub fn parse_import(text: &str) -> Result<ImportData> {
    let document: Value = serde_json::from_str(text)?;
    if !validate_document(&document) {
        return Err(CategorizerError::InvalidImport("invalid data format".to_string()));
    }

    let data = &document["data"];
    let categories: Vec<String> = serde_json::from_value(data[CATEGORIES_KEY].clone())
        .map_err(|e| CategorizerError::InvalidImport(format!("categories: {}", e)))?;
    let bookmark_categories: BookmarkCategories =
        serde_json::from_value(data[BOOKMARK_CATEGORIES_KEY].clone())
            .map_err(|e| CategorizerError::InvalidImport(format!("bookmarkCategories: {}", e)))?;

    let settings = data.get("settings");
    Ok(ImportData {
        categories,
        bookmark_categories,
        settings: Settings {
            theme: theme_from_value(settings.and_then(|s| s.get("theme"))),
            page_size: page_size_from_value(settings.and_then(|s| s.get("pageSize"))),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Theme, DEFAULT_PAGE_SIZE};
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_data() -> CategoryData {
        let mut mapping = BookmarkCategories::new();
        mapping.insert("b1".into(), "Work".into());
        mapping.insert("b7".into(), "Gone".into());
        CategoryData {
            categories: vec!["Work".into(), "Other".into()],
            bookmark_categories: mapping,
        }
    }

    #[test]
    fn test_export_shape_and_filename() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 8, 30, 0).unwrap();
        let doc = ExportDocument::new(
            &sample_data(),
            Settings { theme: Theme::Dark, page_size: 50 },
            now,
        );
        let value: Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();

        assert_eq!(value["version"], "1.0");
        assert_eq!(value["exportDate"], "2026-10-17T08:30:00.000Z");
        assert_eq!(value["data"]["categories"], json!(["Work", "Other"]));
        assert_eq!(value["data"]["bookmarkCategories"]["b1"], "Work");
        assert_eq!(value["data"]["settings"], json!({ "theme": "dark", "pageSize": 50 }));
        assert_eq!(export_filename(now), "bookmark-categories-2026-10-17.json");
    }

    #[test]
    fn test_export_then_parse_restores_everything() {
        let settings = Settings { theme: Theme::Light, page_size: 10 };
        let doc = ExportDocument::new(&sample_data(), settings, Utc::now());
        let imported = parse_import(&doc.to_json().unwrap()).unwrap();
        assert_eq!(imported.category_data(), sample_data());
        assert_eq!(imported.settings, settings);
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        let good = json!({ "version": "1.0", "data": { "categories": [], "bookmarkCategories": {} } });
        assert!(validate_document(&good));

        for bad in [
            json!(null),
            json!([]),
            json!({ "data": { "categories": [], "bookmarkCategories": {} } }),
            json!({ "version": "", "data": { "categories": [], "bookmarkCategories": {} } }),
            json!({ "version": "1.0" }),
            json!({ "version": "1.0", "data": null }),
            json!({ "version": "1.0", "data": { "categories": {}, "bookmarkCategories": {} } }),
            json!({ "version": "1.0", "data": { "categories": [], "bookmarkCategories": [] } }),
            json!({ "version": "1.0", "data": { "categories": [], "bookmarkCategories": null } }),
        ] {
            assert!(!validate_document(&bad), "accepted {}", bad);
        }
    }

    #[test]
    fn test_parse_reports_malformed_json() {
        assert!(matches!(parse_import("{ not json"), Err(CategorizerError::Json(_))));
        assert!(matches!(
            parse_import(r#"{"version":"1.0","data":{"categories":[],"bookmarkCategories":["b1"]}}"#),
            Err(CategorizerError::InvalidImport(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_string_entries() {
        let text = r#"{"version":"1.0","data":{"categories":[1,2],"bookmarkCategories":{}}}"#;
        assert!(matches!(parse_import(text), Err(CategorizerError::InvalidImport(_))));
    }

    #[test]
    fn test_missing_settings_fall_back_to_defaults() {
        let text = r#"{"version":1,"data":{"categories":["A"],"bookmarkCategories":{"b1":"A"}}}"#;
        let imported = parse_import(text).unwrap();
        assert_eq!(imported.settings, Settings::default());
        assert_eq!(imported.settings.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(imported.bookmark_categories["b1"], "A");
    }
}
