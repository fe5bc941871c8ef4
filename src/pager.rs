//! "Load more" pagination: each page is appended to what is already shown.

use crate::index::IndexedBookmark;
use crate::settings::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone)]
pub struct Pager {
    page_size: usize,
    current_page: usize,
    rendered: Vec<IndexedBookmark>,
    has_more: bool,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pager {
    /// A zero page size is clamped to 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current_page: 1,
            rendered: Vec::new(),
            has_more: false,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Everything appended since the last reset.
    pub fn rendered(&self) -> &[IndexedBookmark] {
        &self.rendered
    }

    /// Whether the "load more" control should be shown.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
        self.rendered.clear();
        self.has_more = false;
    }

    /// Appends the window `[(page-1)*size, page*size)` of `items` and returns it.
    /// Pages past the end append nothing.
    pub fn render_page(&mut self, items: &[IndexedBookmark], page: usize) -> &[IndexedBookmark] {
        let start = page.saturating_sub(1).saturating_mul(self.page_size).min(items.len());
        let end = page.saturating_mul(self.page_size);

        let appended_from = self.rendered.len();
        self.rendered.extend_from_slice(&items[start..end.min(items.len()).max(start)]);
        self.has_more = end < items.len();

        &self.rendered[appended_from..]
    }

    pub fn load_more(&mut self, items: &[IndexedBookmark]) -> &[IndexedBookmark] {
        self.current_page += 1;
        let page = self.current_page;
        self.render_page(items, page)
    }

    /// Reset and show the first page of the unchanged `items` with the new size.
    pub fn set_page_size(&mut self, page_size: usize, items: &[IndexedBookmark]) {
        self.page_size = page_size.max(1);
        self.reset();
        self.render_page(items, 1);
    }

    /// Re-renders pages `1..=current_page` after `items` changed underneath.
    pub fn rerender(&mut self, items: &[IndexedBookmark]) {
        let pages = self.current_page;
        self.reset();
        for page in 1..=pages {
            self.render_page(items, page);
        }
        self.current_page = pages;
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::browsers::Bookmark;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_pages_concatenate_to_input(len in 0usize..60, page_size in 1usize..12) {
            let items: Vec<IndexedBookmark> = (0..len)
                .map(|i| IndexedBookmark {
                    bookmark: Bookmark::leaf(i.to_string(), "t", "https://x.test"),
                    category: "c".into(),
                })
                .collect();

            let mut pager = Pager::new(page_size);
            pager.render_page(&items, 1);
            prop_assert_eq!(!pager.has_more(), page_size >= len);

            let pages = len.div_ceil(page_size).max(1);
            for _ in 1..pages {
                pager.load_more(&items);
                prop_assert_eq!(!pager.has_more(), pager.current_page() * page_size >= len);
            }

            prop_assert_eq!(pager.rendered(), &items[..]);
            prop_assert!(!pager.has_more());
        }
    }
}
