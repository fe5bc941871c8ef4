//! 书签索引 - flattens the host tree into the list every view is derived from.

use serde::Serialize;

use crate::browsers::Bookmark;
use crate::category_store::BookmarkCategories;

/// Display label for bookmarks without a mapping entry. Never stored.
pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedBookmark {
    pub bookmark: Bookmark,
    pub category: String,
}

impl IndexedBookmark {
    pub fn id(&self) -> &str {
        &self.bookmark.id
    }

    pub fn title(&self) -> &str {
        &self.bookmark.title
    }

    pub fn url(&self) -> &str {
        self.bookmark.url.as_deref().unwrap_or("")
    }

    pub fn is_uncategorized(&self) -> bool {
        self.category == UNCATEGORIZED
    }
}

/// Emits one entry per leaf, depth-first in sibling order. Folders are never emitted.
pub fn build_index(root: &Bookmark, mapping: &BookmarkCategories) -> Vec<IndexedBookmark> {
    let mut indexed = Vec::new();
    collect_leaves(std::slice::from_ref(root), mapping, &mut indexed);
    indexed
}

fn collect_leaves(
    nodes: &[Bookmark],
    mapping: &BookmarkCategories,
    indexed: &mut Vec<IndexedBookmark>,
) {
    for node in nodes {
        if node.folder {
            collect_leaves(&node.children, mapping, indexed);
        } else if node.url.is_some() {
            let category = mapping
                .get(&node.id)
                .cloned()
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            indexed.push(IndexedBookmark {
                bookmark: Bookmark {
                    children: vec![],
                    ..node.clone()
                },
                category,
            });
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_tree() -> impl Strategy<Value = Bookmark> {
        let leaf = "[a-z]{1,6}".prop_map(|title| Bookmark::leaf("", title.clone(), format!("https://{}.test", title)));
        leaf.prop_recursive(4, 40, 5, |inner| {
            prop::collection::vec(inner, 0..5).prop_map(|children| Bookmark::folder("", "folder", children))
        })
    }

    // give every node a unique id in pre-order so leaves can be tracked
    fn number(node: &mut Bookmark, next: &mut usize) {
        node.id = next.to_string();
        *next += 1;
        for child in &mut node.children {
            number(child, next);
        }
    }

    fn leaves_preorder(node: &Bookmark, out: &mut Vec<String>) {
        if node.folder {
            for child in &node.children {
                leaves_preorder(child, out);
            }
        } else {
            out.push(node.id.clone());
        }
    }

    proptest! {
        #[test]
        fn prop_index_emits_each_leaf_once_in_order(mut root in arb_tree()) {
            let mut next = 0;
            number(&mut root, &mut next);

            let mut expected = Vec::new();
            leaves_preorder(&root, &mut expected);

            let indexed = build_index(&root, &BookmarkCategories::new());
            let ids: Vec<String> = indexed.iter().map(|b| b.id().to_string()).collect();
            prop_assert_eq!(ids, expected);
            prop_assert!(indexed.iter().all(|b| b.is_uncategorized()));
        }
    }
}
