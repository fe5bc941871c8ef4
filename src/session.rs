//! The controller a popup view binds to.
//!
//! `Session` owns all view state (index, active filter, pager, batch selection,
//! open dialog, notifications) and resets it at well defined points: reload,
//! filter changes, batch mode exit and page size changes. Every host call is
//! awaited in place, so a caller observes operations strictly in sequence.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::batch::{BatchMode, BatchSelection};
use crate::browsers::BookmarkProvider;
use crate::category_store::CategoryStore;
use crate::error::{CategorizerError, Result};
use crate::filter::{apply_filter, CategoryFilter};
use crate::index::{build_index, IndexedBookmark};
use crate::notification::{Notification, NotificationCenter, DEFAULT_NOTIFICATION_TTL};
use crate::pager::Pager;
use crate::settings::{save_page_size, save_theme, validate_page_size, Settings, Theme};
use crate::storage::SettingsStorage;
use crate::transfer::{parse_import, ExportDocument};

/// Outcome of a batch delete. Host removals are independent, so some may fail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteReport {
    pub deleted: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl DeleteReport {
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.failed.is_empty()
    }
}

pub struct Session<P: BookmarkProvider, S: SettingsStorage> {
    provider: P,
    storage: S,
    categories: Vec<String>,
    all_bookmarks: Vec<IndexedBookmark>,
    filtered: Vec<IndexedBookmark>,
    query: String,
    category_filter: CategoryFilter,
    pager: Pager,
    no_results: bool,
    batch: BatchSelection,
    dialog_target: Option<String>,
    settings: Settings,
    notifications: NotificationCenter,
}

impl<P: BookmarkProvider, S: SettingsStorage> Session<P, S> {
    pub fn new(provider: P, storage: S) -> Self {
        Self::with_notification_ttl(provider, storage, DEFAULT_NOTIFICATION_TTL)
    }

    pub fn with_notification_ttl(provider: P, storage: S, ttl: Duration) -> Self {
        let settings = Settings::default();
        Self {
            provider,
            storage,
            categories: Vec::new(),
            all_bookmarks: Vec::new(),
            filtered: Vec::new(),
            query: String::new(),
            category_filter: CategoryFilter::All,
            pager: Pager::new(settings.page_size),
            no_results: false,
            batch: BatchSelection::new(),
            dialog_target: None,
            settings,
            notifications: NotificationCenter::new(ttl),
        }
    }

    // ---- accessors ----

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn all_bookmarks(&self) -> &[IndexedBookmark] {
        &self.all_bookmarks
    }

    pub fn filtered(&self) -> &[IndexedBookmark] {
        &self.filtered
    }

    /// Rows currently shown in the list.
    pub fn rendered(&self) -> &[IndexedBookmark] {
        self.pager.rendered()
    }

    pub fn has_more(&self) -> bool {
        self.pager.has_more()
    }

    pub fn current_page(&self) -> usize {
        self.pager.current_page()
    }

    pub fn no_results(&self) -> bool {
        self.no_results
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn category_filter(&self) -> &CategoryFilter {
        &self.category_filter
    }

    pub fn batch(&self) -> &BatchSelection {
        &self.batch
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn notifications(&mut self) -> &mut NotificationCenter {
        &mut self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain()
    }

    /// Options of the single-bookmark category dialog.
    pub fn category_options(&self) -> Vec<String> {
        self.categories.clone()
    }

    /// Options of the batch category select; the leading empty entry is the placeholder.
    pub fn batch_category_options(&self) -> Vec<String> {
        std::iter::once(String::new())
            .chain(self.categories.iter().cloned())
            .collect()
    }

    fn report<T>(&mut self, action: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            error!("❌ {} failed: {}", action, e);
            self.notifications.error(format!("{} failed: {}", action, e));
        }
        result
    }

    // ---- loading and view derivation ----

    /// Re-reads the store, the settings and the host tree, then rebuilds the view
    /// with the active query and category filter.
    pub async fn reload(&mut self) -> Result<()> {
        let result = self.try_reload().await;
        self.report("Load", result)
    }

    async fn try_reload(&mut self) -> Result<()> {
        debug!("📖 Loading categories, settings and bookmark tree");
        let data = CategoryStore::new(&self.storage).load().await?;
        let settings = Settings::load(&self.storage).await?;
        let tree = self.provider.get_tree().await?;

        self.all_bookmarks = build_index(&tree, &data.bookmark_categories);
        self.categories = data.categories;
        self.settings = settings;
        self.pager = Pager::new(settings.page_size);
        self.refilter();

        info!(
            "✅ Loaded {} bookmarks in {} categories from {}",
            self.all_bookmarks.len(),
            self.categories.len(),
            self.provider.name()
        );
        Ok(())
    }

    fn refilter(&mut self) {
        self.filtered = apply_filter(&self.all_bookmarks, &self.query, &self.category_filter);
        self.reset_view();
    }

    fn reset_view(&mut self) {
        self.pager.reset();
        self.no_results = self.filtered.is_empty();
        if !self.no_results {
            self.pager.render_page(&self.filtered, 1);
        }
    }

    pub fn search(&mut self, query: &str) {
        self.query = query.to_string();
        self.refilter();
        debug!("🔍 Search {:?} matched {} bookmarks", query, self.filtered.len());
    }

    pub fn clear_search(&mut self) {
        self.search("");
    }

    pub fn select_category(&mut self, filter: CategoryFilter) {
        self.category_filter = filter;
        self.refilter();
    }

    /// Appends the next page. Past the end this appends nothing.
    pub fn load_more(&mut self) -> &[IndexedBookmark] {
        self.pager.load_more(&self.filtered)
    }

    // ---- settings ----

    /// Persists the new size, then shows the first page of the unchanged view.
    pub async fn set_page_size(&mut self, page_size: usize) -> Result<()> {
        let result = self.try_set_page_size(page_size).await;
        self.report("Saving settings", result)
    }

    async fn try_set_page_size(&mut self, page_size: usize) -> Result<()> {
        validate_page_size(page_size)?;
        save_page_size(&self.storage, page_size).await?;
        self.settings.page_size = page_size;
        self.pager.set_page_size(page_size, &self.filtered);
        self.no_results = self.filtered.is_empty();
        Ok(())
    }

    pub async fn set_theme(&mut self, theme: Theme) -> Result<()> {
        let result = save_theme(&self.storage, theme).await;
        self.report("Saving theme", result)?;
        self.settings.theme = theme;
        Ok(())
    }

    /// Switches between explicit light and dark, starting from what is applied now.
    pub async fn toggle_theme(&mut self, prefers_dark: bool) -> Result<Theme> {
        let theme = self.settings.theme.toggled(prefers_dark);
        self.set_theme(theme).await?;
        Ok(theme)
    }

    // ---- category management ----

    pub async fn add_category(&mut self, name: &str) -> Result<bool> {
        if name.is_empty() {
            return Ok(false);
        }
        let result = self.try_add_category(name).await;
        self.report("Adding category", result)
    }

    async fn try_add_category(&mut self, name: &str) -> Result<bool> {
        let store = CategoryStore::new(&self.storage);
        let added = store.add_category(name).await?;
        if added {
            self.categories = store.load_categories().await?;
        }
        Ok(added)
    }

    pub async fn rename_category(&mut self, old: &str, new: &str) -> Result<bool> {
        let result = CategoryStore::new(&self.storage).rename_category(old, new).await;
        if !self.report("Renaming category", result)? {
            return Ok(false);
        }
        if self.category_filter == CategoryFilter::Category(old.to_string()) {
            self.category_filter = CategoryFilter::Category(new.to_string());
        }
        self.reload().await?;
        Ok(true)
    }

    pub async fn delete_category(&mut self, name: &str) -> Result<bool> {
        let result = CategoryStore::new(&self.storage).delete_category(name).await;
        if !self.report("Deleting category", result)? {
            return Ok(false);
        }
        if self.category_filter == CategoryFilter::Category(name.to_string()) {
            self.category_filter = CategoryFilter::All;
        }
        self.reload().await?;
        Ok(true)
    }

    /// Assigns one bookmark, e.g. after a drop onto a category, then reloads.
    pub async fn assign(&mut self, bookmark_id: &str, category: &str) -> Result<()> {
        let result = CategoryStore::new(&self.storage).assign(bookmark_id, category).await;
        self.report("Saving category", result)?;
        self.reload().await
    }

    pub fn open_category_dialog(&mut self, bookmark_id: &str) {
        self.dialog_target = Some(bookmark_id.to_string());
    }

    pub fn close_category_dialog(&mut self) {
        self.dialog_target = None;
    }

    pub fn category_dialog_target(&self) -> Option<&str> {
        self.dialog_target.as_deref()
    }

    /// Saves the dialog's choice for its bookmark. Returns false without an open dialog.
    pub async fn save_category_dialog(&mut self, category: &str) -> Result<bool> {
        let Some(bookmark_id) = self.dialog_target.clone() else {
            return Ok(false);
        };
        let result = CategoryStore::new(&self.storage).assign(&bookmark_id, category).await;
        self.report("Saving category", result)?;
        self.close_category_dialog();
        self.reload().await?;
        Ok(true)
    }

    // ---- batch mode ----

    pub fn toggle_batch_mode(&mut self) -> BatchMode {
        self.batch.toggle_mode()
    }

    pub fn cancel_batch_mode(&mut self) {
        if self.batch.is_active() {
            self.batch.exit();
        }
    }

    pub fn toggle_selection(&mut self, bookmark_id: &str) -> bool {
        self.batch.toggle(bookmark_id)
    }

    /// Assigns every selected bookmark. Empty selection or empty category does nothing.
    pub async fn batch_assign(&mut self, category: &str) -> Result<bool> {
        if self.batch.is_empty() || category.is_empty() {
            return Ok(false);
        }
        let result = CategoryStore::new(&self.storage)
            .assign_many(self.batch.selected(), category)
            .await;
        let count = self.report("Saving categories", result)?;
        info!("🏷️  Assigned {} bookmarks to {:?}", count, category);

        self.batch.exit();
        self.reload().await?;
        Ok(true)
    }

    /// Removes every selected bookmark from the host, waits for all removals, then
    /// forgets the mapping entries of the ones that went away.
    ///
    /// Removals are not atomic: on partial failure the removed bookmarks stay
    /// removed and the failures are reported in the returned [`DeleteReport`].
    pub async fn batch_delete(&mut self) -> Result<DeleteReport> {
        if self.batch.is_empty() {
            return Ok(DeleteReport::default());
        }

        let ids: Vec<String> = self.batch.selected().iter().cloned().collect();
        info!("🗑️  Deleting {} bookmarks", ids.len());

        let provider = &self.provider;
        let results = join_all(ids.iter().map(|id| async move {
            (id.clone(), provider.remove(id).await)
        }))
        .await;

        let mut report = DeleteReport::default();
        for (id, result) in results {
            match result {
                Ok(()) => report.deleted.push(id),
                Err(e) => {
                    warn!("⚠️  Failed to delete bookmark {}: {}", id, e);
                    report.failed.push((id, e.to_string()));
                }
            }
        }

        let result = CategoryStore::new(&self.storage).forget(&report.deleted).await;
        self.report("Deleting bookmarks", result)?;

        self.batch.exit();
        self.reload().await?;

        if report.failed.is_empty() {
            self.notifications
                .success(format!("Deleted {} bookmarks", report.deleted.len()));
        } else {
            let (id, reason) = &report.failed[0];
            self.notifications.error(format!(
                "Deleted {} bookmarks, {} failed ({}: {})",
                report.deleted.len(),
                report.failed.len(),
                id,
                reason
            ));
        }
        Ok(report)
    }

    // ---- single bookmark delete ----

    /// Deletes one bookmark, closes views showing it (best effort) and drops it from
    /// the current view without resetting the page.
    pub async fn delete_bookmark(&mut self, bookmark_id: &str) -> Result<()> {
        let result = self.try_delete_bookmark(bookmark_id).await;
        self.report("Delete", result)?;
        self.notifications.success("Bookmark deleted");
        Ok(())
    }

    async fn try_delete_bookmark(&mut self, bookmark_id: &str) -> Result<()> {
        let url = self
            .all_bookmarks
            .iter()
            .find(|b| b.id() == bookmark_id)
            .map(|b| b.url().to_string())
            .ok_or_else(|| CategorizerError::BookmarkNotFound(bookmark_id.to_string()))?;

        let views = match self.provider.open_views(&url).await {
            Ok(views) => views,
            Err(e) => {
                debug!("Couldn't query views for {}: {}", url, e);
                Vec::new()
            }
        };

        self.provider.remove(bookmark_id).await?;

        if !views.is_empty() {
            let view_ids: Vec<u64> = views.iter().map(|v| v.id).collect();
            if let Err(e) = self.provider.close_views(&view_ids).await {
                warn!("⚠️  Couldn't close {} views for {}: {}", view_ids.len(), url, e);
            }
        }

        let id = bookmark_id.to_string();
        CategoryStore::new(&self.storage).forget([&id]).await?;

        self.all_bookmarks.retain(|b| b.id() != bookmark_id);
        self.filtered.retain(|b| b.id() != bookmark_id);
        if self.batch.is_selected(bookmark_id) {
            self.batch.toggle(bookmark_id);
        }
        self.pager.rerender(&self.filtered);
        self.no_results = self.filtered.is_empty();

        info!("🗑️  Deleted bookmark {} ({})", bookmark_id, url);
        Ok(())
    }

    // ---- import / export ----

    pub async fn export(&mut self, now: DateTime<Utc>) -> Result<ExportDocument> {
        let result = self.try_export(now).await;
        let document = self.report("Export", result)?;
        self.notifications.success("Export succeeded");
        Ok(document)
    }

    async fn try_export(&self, now: DateTime<Utc>) -> Result<ExportDocument> {
        let data = CategoryStore::new(&self.storage).load().await?;
        let settings = Settings::load(&self.storage).await?;
        Ok(ExportDocument::new(&data, settings, now))
    }

    /// Replaces categories, mapping and settings wholesale from an export document.
    /// Nothing is written unless the whole document validates.
    pub async fn import_json(&mut self, text: &str) -> Result<()> {
        let result = self.try_import(text).await;
        self.report("Import", result)?;
        self.notifications.success("Import succeeded");
        self.reload().await
    }

    async fn try_import(&self, text: &str) -> Result<()> {
        let data = parse_import(text)?;
        self.storage.set(data.to_items()?).await?;
        info!(
            "📥 Imported {} categories and {} assignments",
            data.categories.len(),
            data.bookmark_categories.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browsers::Bookmark;
    use crate::memory::{MemoryBookmarkProvider, MemoryStorage};

    fn session_with(n: usize) -> Session<MemoryBookmarkProvider, MemoryStorage> {
        let leaves = (0..n)
            .map(|i| Bookmark::leaf(format!("b{}", i), format!("Item {}", i), format!("https://{}.test", i)))
            .collect();
        Session::new(
            MemoryBookmarkProvider::new(Bookmark::folder("0", "", vec![Bookmark::folder("1", "bar", leaves)])),
            MemoryStorage::new(),
        )
    }

    #[tokio::test]
    async fn test_reload_seeds_defaults_and_renders_first_page() {
        let mut session = session_with(25);
        session.reload().await.unwrap();

        assert_eq!(session.categories().len(), 5);
        assert_eq!(session.rendered().len(), 20);
        assert!(session.has_more());

        assert_eq!(session.load_more().len(), 5);
        assert!(!session.has_more());
    }

    #[tokio::test]
    async fn test_empty_search_result_sets_no_results() {
        let mut session = session_with(3);
        session.reload().await.unwrap();
        session.search("nothing like this");
        assert!(session.no_results());
        assert!(session.rendered().is_empty());

        session.clear_search();
        assert!(!session.no_results());
        assert_eq!(session.rendered().len(), 3);
    }

    #[tokio::test]
    async fn test_page_size_change_keeps_view() {
        let mut session = session_with(7);
        session.reload().await.unwrap();
        session.search("item");
        session.set_page_size(3).await.unwrap();

        assert_eq!(session.rendered().len(), 3);
        assert_eq!(session.current_page(), 1);
        assert_eq!(session.filtered().len(), 7);
        assert!(session.set_page_size(0).await.is_err());
        assert!(session.take_notifications().iter().any(|n| n.is_error()));
    }

    #[tokio::test]
    async fn test_dialog_assigns_its_bookmark() {
        let mut session = session_with(2);
        session.reload().await.unwrap();

        assert!(!session.save_category_dialog("工作").await.unwrap());
        session.open_category_dialog("b1");
        assert!(session.save_category_dialog("工作").await.unwrap());
        assert!(session.category_dialog_target().is_none());
        assert_eq!(session.all_bookmarks()[1].category, "工作");
    }

    #[test]
    fn test_batch_options_start_with_placeholder() {
        let mut session = session_with(0);
        session.categories = vec!["A".into()];
        assert_eq!(session.batch_category_options(), vec!["", "A"]);
        assert_eq!(session.category_options(), vec!["A"]);
    }
}
