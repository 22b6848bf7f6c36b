//! Fixtures shared by the unit tests.

use arbor_storage::{
    Language, MemoryStore, MetaId, NewMeta, NewPage, PageId, PageStatus, PageStore, RevisionId,
    TemplateId, UserId, Zone,
};

pub(crate) fn en() -> Language {
    Language::new("en").unwrap()
}

/// Active page row with every flag allowed.
pub(crate) fn new_page(id: u32, parent: u32, sequence: i64, meta_id: MetaId) -> NewPage {
    NewPage {
        id: PageId(id),
        language: en(),
        user_id: UserId(1),
        template_id: TemplateId(1),
        meta_id,
        parent_id: PageId(parent),
        sequence,
        zone: Zone::Page,
        status: PageStatus::Active,
        title: format!("Page {id}"),
        navigation_title: format!("Nav {id}"),
        hidden: false,
        has_extra: false,
        allow_move: true,
        allow_edit: true,
        allow_delete: true,
        allow_children: true,
        created_on: 100,
        edited_on: 100,
        publish_on: 100,
    }
}

/// Insert a page and its meta row straight into the store.
pub(crate) fn seed(
    store: &MemoryStore,
    id: u32,
    parent: u32,
    sequence: i64,
    url: &str,
) -> RevisionId {
    seed_with(store, id, parent, sequence, url, |_| {})
}

/// Like [`seed`], letting the caller adjust the row before insertion.
pub(crate) fn seed_with(
    store: &MemoryStore,
    id: u32,
    parent: u32,
    sequence: i64,
    url: &str,
    edit: impl FnOnce(&mut NewPage),
) -> RevisionId {
    let meta_id = store
        .insert_meta(NewMeta {
            url: url.to_owned(),
            ..Default::default()
        })
        .unwrap();
    let mut page = new_page(id, parent, sequence, meta_id);
    edit(&mut page);
    store.insert_page(page).unwrap()
}

/// Small site:
///
/// ```text
/// 0
/// +-- 1 home ("home")
/// |   +-- 1001 about (seq 1)
/// |   |   +-- 1003 team
/// |   +-- 1002 blog (seq 2)
/// |   +-- 2 sitemap (seq 3)
/// +-- 404 error (seq 2, root zone)
/// +-- 1004 disclaimer (footer zone)
/// ```
pub(crate) fn site() -> MemoryStore {
    let store = MemoryStore::new();
    seed(&store, 1, 0, 1, "home");
    seed(&store, 1001, 1, 1, "about");
    seed(&store, 1002, 1, 2, "blog");
    seed(&store, 2, 1, 3, "sitemap");
    seed(&store, 1003, 1001, 1, "team");
    seed_with(&store, 404, 0, 2, "404", |p| p.zone = Zone::Root);
    seed_with(&store, 1004, 0, 3, "disclaimer", |p| p.zone = Zone::Footer);
    store
}

/// Active sequences of the children of `parent`, ordered by sequence.
pub(crate) fn child_order(store: &MemoryStore, parent: u32) -> Vec<(u32, i64)> {
    store
        .active_children(&[PageId(parent)], &en())
        .unwrap()
        .into_iter()
        .map(|p| (p.id.get(), p.sequence))
        .collect()
}
