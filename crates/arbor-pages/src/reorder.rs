//! Moving pages within the tree.
//!
//! Sibling order is an integer `sequence` per (parent, language). Moves open
//! a gap by shifting later siblings up by one; gaps are never closed, only
//! collisions are avoided.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use arbor_storage::{Language, PageId, PageRecord, PageStatus, PageStore, Position};

use crate::error::PagesError;
use crate::page::apply_reserved_flags;

/// Where a page is dropped relative to the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropKind {
    /// Directly before the target, under the target's parent.
    Before,
    /// Directly after the target, under the target's parent.
    After,
    /// As the last child of the target.
    Inside,
}

impl DropKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Inside => "inside",
        }
    }
}

impl FromStr for DropKind {
    type Err = PagesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            "inside" => Ok(Self::Inside),
            other => Err(PagesError::Validation(format!("unknown drop kind: {other}"))),
        }
    }
}

impl fmt::Display for DropKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Active row of a page with reserved flags applied.
pub(crate) fn active_page(
    store: &dyn PageStore,
    id: PageId,
    language: &Language,
) -> Result<Option<PageRecord>, PagesError> {
    let mut page = store.find_page(id, language, PageStatus::Active)?;
    if let Some(page) = page.as_mut() {
        apply_reserved_flags(page);
    }
    Ok(page)
}

/// Whether `ancestor` appears on the parent chain of `page`.
fn is_ancestor(
    store: &dyn PageStore,
    ancestor: PageId,
    page: &PageRecord,
    language: &Language,
) -> Result<bool, PagesError> {
    let mut seen = HashSet::new();
    let mut current = page.parent_id;
    while current != PageId::ROOT && seen.insert(current) {
        if current == ancestor {
            return Ok(true);
        }
        match store.find_page(current, language, PageStatus::Active)? {
            Some(parent) => current = parent.parent_id,
            None => break,
        }
    }
    Ok(false)
}

/// Move `id` relative to `target` and return its new position.
///
/// Does not rebuild the navigation cache; the caller holds the mutation lock
/// and rebuilds afterwards.
///
/// # Errors
///
/// - [`PagesError::NotFound`] if either page has no active row
/// - [`PagesError::Permission`] if the page can't be moved, the target can't
///   take children for an inside drop, or the target is the page itself or
///   one of its descendants
pub(crate) fn move_page(
    store: &dyn PageStore,
    id: PageId,
    target: PageId,
    kind: DropKind,
    language: &Language,
) -> Result<Position, PagesError> {
    // Home has no siblings to drop next to
    let kind = if target == PageId::HOME { DropKind::Inside } else { kind };

    let page = active_page(store, id, language)?
        .ok_or_else(|| PagesError::NotFound(format!("page {id} ({language})")))?;
    let target_page = active_page(store, target, language)?
        .ok_or_else(|| PagesError::NotFound(format!("target page {target} ({language})")))?;

    if !page.allow_move {
        return Err(PagesError::Permission(format!("page {id} can't be moved")));
    }
    if target == id || is_ancestor(store, id, &target_page, language)? {
        return Err(PagesError::Permission(format!(
            "page {id} can't be moved into its own subtree"
        )));
    }

    let position = match kind {
        DropKind::Inside => {
            if !target_page.allow_children {
                return Err(PagesError::Permission(format!(
                    "page {target} doesn't accept children"
                )));
            }
            let last = store.max_child_sequence(target, language)?;
            Position {
                parent_id: target,
                sequence: last.map_or(1, |s| s + 1),
                zone: target_page.zone,
            }
        }
        DropKind::Before => {
            let parent_id = target_page.parent_id;
            store.shift_sequences(parent_id, language, target_page.sequence, id)?;
            Position {
                parent_id,
                sequence: target_page.sequence,
                zone: target_page.zone,
            }
        }
        DropKind::After => {
            let parent_id = target_page.parent_id;
            let sequence = target_page.sequence + 1;
            store.shift_sequences(parent_id, language, sequence, id)?;
            Position {
                parent_id,
                sequence,
                zone: target_page.zone,
            }
        }
    };

    if !store.update_position(id, language, position)? {
        return Err(PagesError::NotFound(format!("page {id} ({language})")));
    }
    tracing::debug!(
        page_id = %id,
        target = %target,
        kind = %kind,
        parent_id = %position.parent_id,
        sequence = position.sequence,
        "page moved"
    );
    Ok(position)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use arbor_storage::{MemoryStore, Zone};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::{child_order, en, seed, seed_with, site};

    fn mv(
        store: &MemoryStore,
        id: u32,
        target: u32,
        kind: DropKind,
    ) -> Result<Position, PagesError> {
        move_page(store, PageId(id), PageId(target), kind, &en())
    }

    fn ids(order: &[(u32, i64)]) -> Vec<u32> {
        order.iter().map(|(id, _)| *id).collect()
    }

    fn assert_distinct(store: &MemoryStore, parent: u32) {
        let order = child_order(store, parent);
        let unique: HashSet<i64> = order.iter().map(|(_, s)| *s).collect();
        assert_eq!(unique.len(), order.len(), "duplicate sequences: {order:?}");
    }

    #[test]
    fn test_parse_drop_kind() {
        assert_eq!("before".parse::<DropKind>().unwrap(), DropKind::Before);
        assert_eq!("inside".parse::<DropKind>().unwrap(), DropKind::Inside);
        assert!(matches!(
            "sideways".parse::<DropKind>(),
            Err(PagesError::Validation(_))
        ));
    }

    #[test]
    fn test_move_before() {
        let store = site();

        // sitemap (seq 3) before about (seq 1)
        let pos = mv(&store, 2, 1001, DropKind::Before).unwrap();

        assert_eq!(pos.sequence, 1);
        assert_eq!(ids(&child_order(&store, 1)), vec![2, 1001, 1002]);
        assert_distinct(&store, 1);
    }

    #[test]
    fn test_move_after() {
        let store = site();

        let pos = mv(&store, 1001, 1002, DropKind::After).unwrap();

        assert_eq!(pos.sequence, 3);
        assert_eq!(ids(&child_order(&store, 1)), vec![1002, 1001, 2]);
        assert_distinct(&store, 1);
    }

    #[test]
    fn test_move_after_with_adjacent_sibling() {
        let store = MemoryStore::new();
        seed(&store, 1, 0, 1, "home");
        seed(&store, 1001, 1, 1, "a");
        seed(&store, 1002, 1, 2, "b");
        seed(&store, 1003, 1, 3, "c");
        seed(&store, 1004, 1, 4, "d");

        mv(&store, 1004, 1001, DropKind::After).unwrap();

        assert_eq!(ids(&child_order(&store, 1)), vec![1001, 1004, 1002, 1003]);
        assert_distinct(&store, 1);
    }

    #[test]
    fn test_move_inside_appends_last() {
        let store = site();

        let pos = mv(&store, 1002, 1001, DropKind::Inside).unwrap();

        assert_eq!(pos.parent_id, PageId(1001));
        assert_eq!(child_order(&store, 1001), vec![(1003, 1), (1002, 2)]);
        assert_eq!(ids(&child_order(&store, 1)), vec![1001, 2]);
    }

    #[test]
    fn test_move_inside_empty_parent_starts_at_one() {
        let store = site();

        let pos = mv(&store, 1002, 1003, DropKind::Inside).unwrap();

        assert_eq!(pos.sequence, 1);
    }

    #[test]
    fn test_drop_on_home_forces_inside() {
        let store = site();

        let pos = mv(&store, 1003, 1, DropKind::Before).unwrap();

        assert_eq!(pos.parent_id, PageId::HOME);
        assert_eq!(ids(&child_order(&store, 1)), vec![1001, 1002, 2, 1003]);
    }

    #[test]
    fn test_zone_taken_from_target() {
        let store = site();

        let pos = mv(&store, 1002, 1004, DropKind::After).unwrap();

        assert_eq!(pos.zone, Zone::Footer);
        assert_eq!(pos.parent_id, PageId::ROOT);
        let row = store
            .find_page(PageId(1002), &en(), PageStatus::Active)
            .unwrap()
            .unwrap();
        assert_eq!(row.zone, Zone::Footer);
    }

    #[test]
    fn test_before_then_after_keeps_page_adjacent() {
        let store = site();

        mv(&store, 2, 1002, DropKind::Before).unwrap();
        assert_eq!(ids(&child_order(&store, 1)), vec![1001, 2, 1002]);
        mv(&store, 2, 1002, DropKind::After).unwrap();

        assert_eq!(ids(&child_order(&store, 1)), vec![1001, 1002, 2]);
        assert_distinct(&store, 1);
    }

    #[test]
    fn test_sequences_stay_distinct_across_many_moves() {
        let store = MemoryStore::new();
        seed(&store, 1, 0, 1, "home");
        for i in 0..6 {
            seed(&store, 1001 + i, 1, i64::from(i) + 1, &format!("p{i}"));
        }
        let moves = [
            (1001, 1006, DropKind::After),
            (1003, 1001, DropKind::Before),
            (1006, 1002, DropKind::Before),
            (1004, 1003, DropKind::After),
            (1002, 1005, DropKind::Before),
            (1005, 1004, DropKind::After),
        ];

        for (id, target, kind) in moves {
            mv(&store, id, target, kind).unwrap();
            assert_distinct(&store, 1);
        }
        assert_eq!(child_order(&store, 1).len(), 6);
    }

    #[test]
    fn test_missing_pages() {
        let store = site();

        assert!(matches!(mv(&store, 9999, 1001, DropKind::After), Err(PagesError::NotFound(_))));
        assert!(matches!(mv(&store, 1001, 9999, DropKind::After), Err(PagesError::NotFound(_))));
    }

    #[test]
    fn test_reserved_pages_cannot_move() {
        let store = site();

        assert!(matches!(mv(&store, 1, 1004, DropKind::After), Err(PagesError::Permission(_))));
        assert!(matches!(mv(&store, 404, 1004, DropKind::After), Err(PagesError::Permission(_))));
    }

    #[test]
    fn test_error_page_takes_no_children() {
        let store = site();

        let err = mv(&store, 1002, 404, DropKind::Inside).unwrap_err();

        assert!(matches!(err, PagesError::Permission(_)));
        assert_eq!(ids(&child_order(&store, 1)), vec![1001, 1002, 2]);
    }

    #[test]
    fn test_flag_forbids_children() {
        let store = site();
        seed_with(&store, 1010, 1, 9, "leaf", |p| p.allow_children = false);

        assert!(matches!(mv(&store, 1002, 1010, DropKind::Inside), Err(PagesError::Permission(_))));
        mv(&store, 1002, 1010, DropKind::After).unwrap();
    }

    #[test]
    fn test_cannot_move_into_own_subtree() {
        let store = site();

        assert!(matches!(mv(&store, 1001, 1003, DropKind::Inside), Err(PagesError::Permission(_))));
        assert!(matches!(mv(&store, 1001, 1003, DropKind::Before), Err(PagesError::Permission(_))));
        assert!(matches!(mv(&store, 1001, 1001, DropKind::After), Err(PagesError::Permission(_))));
        assert_eq!(child_order(&store, 1001), vec![(1003, 1)]);
    }
}
