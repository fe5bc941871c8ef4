use std::collections::BTreeMap;

use crate::index::{IndexedBookmark, UNCATEGORIZED};

/// Per-category bookmark counts, in category list order.
pub struct CategoryReport {
    counts: Vec<(String, usize)>,
    uncategorized: usize,
    /// Labels used by bookmarks but missing from the category list.
    dangling: BTreeMap<String, usize>,
    total: usize,
}

impl CategoryReport {
    pub fn new(categories: &[String], bookmarks: &[IndexedBookmark]) -> Self {
        let mut counts: Vec<(String, usize)> = categories.iter().map(|c| (c.clone(), 0)).collect();
        let mut uncategorized = 0;
        let mut dangling = BTreeMap::new();

        for bookmark in bookmarks {
            if bookmark.category == UNCATEGORIZED {
                uncategorized += 1;
            } else if let Some(entry) = counts.iter_mut().find(|(name, _)| *name == bookmark.category) {
                entry.1 += 1;
            } else {
                *dangling.entry(bookmark.category.clone()).or_insert(0) += 1;
            }
        }

        Self {
            counts,
            uncategorized,
            dangling,
            total: bookmarks.len(),
        }
    }

    pub fn count(&self, category: &str) -> Option<usize> {
        self.counts
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, count)| *count)
    }

    pub fn uncategorized(&self) -> usize {
        self.uncategorized
    }

    pub fn dangling(&self) -> &BTreeMap<String, usize> {
        &self.dangling
    }

    pub fn format(&self, detailed: bool) -> String {
        let mut output = String::new();

        output.push_str("\n🏷️  Bookmark Categories\n");
        output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

        for (name, count) in &self.counts {
            output.push_str(&format!("  • {}: {} bookmarks\n", name, count));
        }
        output.push_str(&format!("  • {}: {} bookmarks\n", UNCATEGORIZED, self.uncategorized));
        output.push('\n');

        if !self.dangling.is_empty() {
            output.push_str("⚠️  Labels without a category:\n");
            for (label, count) in &self.dangling {
                output.push_str(&format!("  • {}", label));
                if detailed {
                    output.push_str(&format!(": {} bookmarks", count));
                }
                output.push('\n');
            }
            output.push('\n');
        }

        output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        let categorized = self.total - self.uncategorized;
        output.push_str(&format!(
            "\n📊 Summary: {}/{} bookmarks categorized\n\n",
            categorized, self.total
        ));

        output
    }
}
