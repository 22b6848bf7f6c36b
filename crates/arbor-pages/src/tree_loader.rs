//! Breadth-first loading of the active page tree.
//!
//! The tree is fetched one level at a time: level 1 holds the active pages
//! whose parent is one of the root ids, level 2 their children, and so on
//! until a level comes back empty. Pages are kept in a flat arena in the
//! order they were loaded, so every parent precedes its children.

use std::collections::HashMap;

use arbor_storage::{Language, PageId, PageStore, PageSummary};

use crate::error::PagesError;

/// Level-ordered arena of active pages.
#[derive(Debug, Default)]
pub struct Forest {
    /// Pages in load order (level by level, sequence order within a level).
    pages: Vec<PageSummary>,
    /// Arena indices per level; `levels[0]` is level 1.
    levels: Vec<Vec<usize>>,
    /// Page id to arena index.
    index: HashMap<PageId, usize>,
}

impl Forest {
    /// Pages in load order. Parents always come before their children.
    pub fn pages(&self) -> &[PageSummary] {
        &self.pages
    }

    /// Number of levels loaded.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Pages on a level, starting at 1.
    pub fn level(&self, level: usize) -> impl Iterator<Item = &PageSummary> {
        level
            .checked_sub(1)
            .and_then(|i| self.levels.get(i))
            .into_iter()
            .flatten()
            .map(|&i| &self.pages[i])
    }

    /// Look up a page by id.
    pub fn get(&self, id: PageId) -> Option<&PageSummary> {
        self.index.get(&id).map(|&i| &self.pages[i])
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Load every active page of `language` reachable from `roots`.
///
/// A page id met twice (corrupt parent links forming a cycle, or duplicate
/// active rows) is skipped after the first occurrence, so loading always
/// terminates.
///
/// # Errors
///
/// Returns [`PagesError::Persistence`] if the store query fails.
pub fn load_forest(
    store: &dyn PageStore,
    roots: &[PageId],
    language: &Language,
) -> Result<Forest, PagesError> {
    let mut forest = Forest::default();
    let mut parents = roots.to_vec();

    while !parents.is_empty() {
        let rows = store.active_children(&parents, language)?;
        let mut level = Vec::with_capacity(rows.len());

        for row in rows {
            if forest.index.contains_key(&row.id) {
                tracing::warn!(
                    page_id = %row.id,
                    parent_id = %row.parent_id,
                    language = %language,
                    "page reached twice while loading tree, skipping"
                );
                continue;
            }
            let idx = forest.pages.len();
            forest.index.insert(row.id, idx);
            forest.pages.push(row);
            level.push(idx);
        }

        if level.is_empty() {
            break;
        }
        tracing::debug!(level = forest.levels.len() + 1, pages = level.len(), "tree level loaded");
        parents = level.iter().map(|&i| forest.pages[i].id).collect();
        forest.levels.push(level);
    }

    Ok(forest)
}
