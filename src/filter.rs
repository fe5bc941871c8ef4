//! Search and category filtering over the bookmark index.

use std::fmt;

use crate::index::IndexedBookmark;

/// Category constraint of a view. `All` is the "no constraint" sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Category(String),
}

impl CategoryFilter {
    /// Exact, case-sensitive comparison against the resolved label.
    pub fn accepts(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Category(name) => name == category,
        }
    }
}

impl From<Option<String>> for CategoryFilter {
    fn from(value: Option<String>) -> Self {
        value.map(CategoryFilter::Category).unwrap_or_default()
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Category(name) => f.write_str(name),
        }
    }
}

/// Case-insensitive substring match over title, URL and category.
/// `query_lower` must already be lowercased.
fn matches_query(entry: &IndexedBookmark, query_lower: &str) -> bool {
    entry.title().to_lowercase().contains(query_lower)
        || entry.url().to_lowercase().contains(query_lower)
        || entry.category.to_lowercase().contains(query_lower)
}

/// Keeps entries passing both the category filter and the query, in input order.
pub fn apply_filter(
    all: &[IndexedBookmark],
    query: &str,
    filter: &CategoryFilter,
) -> Vec<IndexedBookmark> {
    let query_lower = query.to_lowercase();
    all.iter()
        .filter(|entry| filter.accepts(&entry.category))
        .filter(|entry| query_lower.is_empty() || matches_query(entry, &query_lower))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browsers::Bookmark;
    use crate::index::UNCATEGORIZED;

    fn entry(id: &str, title: &str, url: &str, category: &str) -> IndexedBookmark {
        IndexedBookmark {
            bookmark: Bookmark::leaf(id, title, url),
            category: category.to_string(),
        }
    }

    fn sample() -> Vec<IndexedBookmark> {
        vec![
            entry("b1", "Rust Book", "https://doc.rust-lang.org/book", "Study"),
            entry("b2", "Inbox", "https://mail.example.com", "Work"),
            entry("b3", "Videos", "https://video.example.com", UNCATEGORIZED),
        ]
    }

    #[test]
    fn test_empty_query_and_all_is_identity() {
        assert_eq!(apply_filter(&sample(), "", &CategoryFilter::All), sample());
    }

    #[test]
    fn test_query_is_case_insensitive_over_title_url_and_category() {
        let ids = |v: Vec<IndexedBookmark>| v.into_iter().map(|e| e.bookmark.id).collect::<Vec<_>>();
        assert_eq!(ids(apply_filter(&sample(), "RUST", &CategoryFilter::All)), vec!["b1"]);
        assert_eq!(ids(apply_filter(&sample(), "mail.EXAMPLE", &CategoryFilter::All)), vec!["b2"]);
        assert_eq!(ids(apply_filter(&sample(), "work", &CategoryFilter::All)), vec!["b2"]);
        assert_eq!(ids(apply_filter(&sample(), "example", &CategoryFilter::All)), vec!["b2", "b3"]);
    }

    #[test]
    fn test_category_filter_is_exact() {
        let work = CategoryFilter::Category("Work".into());
        assert_eq!(apply_filter(&sample(), "", &work).len(), 1);
        let lower = CategoryFilter::Category("work".into());
        assert!(apply_filter(&sample(), "", &lower).is_empty());
    }

    #[test]
    fn test_query_and_category_combine_with_and() {
        let work = CategoryFilter::Category("Work".into());
        assert!(apply_filter(&sample(), "video", &work).is_empty());
        assert_eq!(apply_filter(&sample(), "inbox", &work).len(), 1);
    }

    #[test]
    fn test_uncategorized_is_filterable() {
        let filter = CategoryFilter::Category(UNCATEGORIZED.into());
        assert_eq!(apply_filter(&sample(), "", &filter)[0].bookmark.id, "b3");
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::browsers::Bookmark;
    use proptest::prelude::*;

    fn arb_entries() -> impl Strategy<Value = Vec<IndexedBookmark>> {
        prop::collection::vec(
            ("[a-zA-Z ]{0,8}", "[a-z]{1,6}", prop::sample::select(vec!["Work", "Study", "uncategorized"])),
            0..30,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (title, host, category))| IndexedBookmark {
                    bookmark: Bookmark::leaf(i.to_string(), title, format!("https://{}.test", host)),
                    category: category.to_string(),
                })
                .collect()
        })
    }

    fn arb_filter() -> impl Strategy<Value = CategoryFilter> {
        prop_oneof![
            Just(CategoryFilter::All),
            Just(CategoryFilter::Category("Work".into())),
            Just(CategoryFilter::Category("uncategorized".into())),
        ]
    }

    proptest! {
        #[test]
        fn prop_identity(entries in arb_entries()) {
            prop_assert_eq!(apply_filter(&entries, "", &CategoryFilter::All), entries);
        }

        #[test]
        fn prop_idempotent(entries in arb_entries(), query in "[a-zA-Z]{0,3}", filter in arb_filter()) {
            let once = apply_filter(&entries, &query, &filter);
            let twice = apply_filter(&once, &query, &filter);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_result_is_ordered_subsequence(entries in arb_entries(), query in "[a-z]{0,2}", filter in arb_filter()) {
            let result = apply_filter(&entries, &query, &filter);
            let mut remaining = entries.iter();
            for kept in &result {
                prop_assert!(remaining.any(|e| e == kept));
            }
        }
    }
}
