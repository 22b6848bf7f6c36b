//! Typed reader for the navigation cache artifacts.
//!
//! [`NavigationCache`] is what URL lookups and menu rendering consult. It is
//! loaded from the `navigation` bucket written by
//! [`NavigationBuilder`](crate::NavigationBuilder) and never recomputed lazily.

use arbor_cache::{Cache, CacheBucketExt};
use arbor_storage::{Language, PageId, Zone};
use serde::Serialize;

use crate::compiler::{
    BUCKET, CompiledNavigation, NavigationEntry, NavigationIndex, UrlMap, keys_key, navigation_key,
};
use crate::error::PagesError;
use crate::page::TreeType;

/// A menu node with its visible descendants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    #[serde(flatten)]
    pub entry: NavigationEntry,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuItem>,
}

/// The four sections of the page tree as shown to editors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TreeView {
    /// Home page with its whole subtree.
    pub home: Option<MenuItem>,
    /// Meta zone pages with their subtrees.
    pub meta: Vec<MenuItem>,
    /// Footer zone pages (flat).
    pub footer: Vec<MenuItem>,
    /// Root zone pages with their subtrees.
    pub root: Vec<MenuItem>,
}

/// Loaded navigation cache of one language.
#[derive(Clone, Debug)]
pub struct NavigationCache {
    language: Language,
    generated_at: Option<i64>,
    keys: UrlMap,
    navigation: NavigationIndex,
}

impl NavigationCache {
    /// Load both artifacts for `language`.
    ///
    /// Returns `Ok(None)` if either artifact is missing or the two come from
    /// different rebuilds.
    ///
    /// # Errors
    ///
    /// Returns [`PagesError::Persistence`] if an artifact exists but can't be
    /// read or decoded.
    pub fn load(cache: &dyn Cache, language: &Language) -> Result<Option<Self>, PagesError> {
        let bucket = cache.bucket(BUCKET);
        let (keys_key, navigation_key) = (keys_key(language), navigation_key(language));

        let (Some(etag), Some(navigation_etag)) =
            (bucket.etag(&keys_key)?, bucket.etag(&navigation_key)?)
        else {
            return Ok(None);
        };
        // Both artifacts carry the generation time of the rebuild that wrote them
        if etag != navigation_etag {
            tracing::debug!(
                language = %language,
                "navigation artifacts are from different rebuilds"
            );
            return Ok(None);
        }
        let Some(keys) = bucket.get_json::<UrlMap>(&keys_key, &etag)? else {
            return Ok(None);
        };
        let Some(navigation) = bucket.get_json::<NavigationIndex>(&navigation_key, &etag)? else {
            return Ok(None);
        };
        let generated_at = etag.parse().ok();

        Ok(Some(Self {
            language: language.clone(),
            generated_at,
            keys,
            navigation,
        }))
    }

    /// Wrap a freshly compiled cache.
    pub fn from_compiled(language: Language, compiled: CompiledNavigation) -> Self {
        Self {
            language,
            generated_at: None,
            keys: compiled.keys,
            navigation: compiled.navigation,
        }
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Generation time (Unix seconds) recorded with the artifacts.
    pub fn generated_at(&self) -> Option<i64> {
        self.generated_at
    }

    pub fn keys(&self) -> &UrlMap {
        &self.keys
    }

    pub fn index(&self) -> &NavigationIndex {
        &self.navigation
    }

    /// Full URL of a page without leading slash.
    ///
    /// The root (id 0) has the empty URL.
    ///
    /// # Errors
    ///
    /// Returns [`PagesError::UnresolvedUrl`] if the page has no cache entry.
    pub fn full_url(&self, id: PageId) -> Result<&str, PagesError> {
        if id == PageId::ROOT {
            return Ok("");
        }
        self.keys.get(id).ok_or_else(|| {
            PagesError::UnresolvedUrl(format!(
                "page {id} has no navigation entry for language {}",
                self.language
            ))
        })
    }

    /// Children of `parent` in `zone`, in tree order.
    pub fn children(&self, zone: Zone, parent: PageId) -> &[NavigationEntry] {
        self.navigation.children(zone, parent)
    }

    /// Nested menu below `parent`, skipping hidden pages.
    ///
    /// `max_depth` limits nesting (1 returns only direct children); `None`
    /// descends to the leaves.
    pub fn menu(&self, zone: Zone, parent: PageId, max_depth: Option<usize>) -> Vec<MenuItem> {
        self.subtree(zone, parent, max_depth, false)
    }

    /// Every section of the tree, hidden pages included.
    pub fn tree_view(&self) -> TreeView {
        let home = self
            .children(Zone::Page, PageId::ROOT)
            .iter()
            .find(|e| e.page_id == PageId::HOME)
            .map(|entry| MenuItem {
                entry: entry.clone(),
                children: self.subtree(Zone::Page, PageId::HOME, None, true),
            });

        TreeView {
            home,
            meta: self.subtree(Zone::Meta, PageId::ROOT, None, true),
            footer: self.subtree(Zone::Footer, PageId::ROOT, Some(1), true),
            root: self.subtree(Zone::Root, PageId::ROOT, None, true),
        }
    }

    fn subtree(
        &self,
        zone: Zone,
        parent: PageId,
        max_depth: Option<usize>,
        include_hidden: bool,
    ) -> Vec<MenuItem> {
        if max_depth == Some(0) {
            return Vec::new();
        }
        let remaining = max_depth.map(|d| d - 1);

        self.children(zone, parent)
            .iter()
            .filter(|e| include_hidden || e.tree_type != TreeType::Hidden)
            .map(|entry| MenuItem {
                entry: entry.clone(),
                children: self.subtree(zone, entry.page_id, remaining, include_hidden),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use arbor_cache::FileCache;
    use arbor_storage::{FileSystem, MemoryStore, MockFileSystem};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::compiler::NavigationBuilder;
    use crate::testing::{en, seed_with, site};

    fn cache() -> FileCache {
        FileCache::new(
            Arc::new(MockFileSystem::new()) as Arc<dyn FileSystem>,
            PathBuf::from("cache"),
            "v1",
        )
    }

    fn loaded(store: &MemoryStore) -> NavigationCache {
        let cache = cache();
        NavigationBuilder::new(store, &cache).rebuild(&en()).unwrap();
        NavigationCache::load(&cache, &en()).unwrap().unwrap()
    }

    fn ids(items: &[MenuItem]) -> Vec<u32> {
        items.iter().map(|i| i.entry.page_id.get()).collect()
    }

    #[test]
    fn test_load_missing_artifacts() {
        assert!(NavigationCache::load(&cache(), &en()).unwrap().is_none());
    }

    #[test]
    fn test_load_ignores_artifacts_of_different_rebuilds() {
        let store = site();
        let cache = cache();
        NavigationBuilder::new(&store, &cache).rebuild(&en()).unwrap();
        cache.bucket(BUCKET).set("keys_en", "0", b"{}").unwrap();

        assert!(NavigationCache::load(&cache, &en()).unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_artifact_fails() {
        let cache = cache();
        cache
            .bucket(BUCKET)
            .set("keys_en", "1", b"not json")
            .unwrap();
        cache.bucket(BUCKET).set("navigation_en", "1", b"[]").unwrap();

        let err = NavigationCache::load(&cache, &en()).unwrap_err();

        assert!(matches!(err, PagesError::Persistence(_)), "{err:?}");
    }

    #[test]
    fn test_full_url_lookup() {
        let nav = loaded(&site());

        assert_eq!(nav.full_url(PageId::ROOT).unwrap(), "");
        assert_eq!(nav.full_url(PageId::HOME).unwrap(), "");
        assert_eq!(nav.full_url(PageId(1003)).unwrap(), "about/team");
        assert!(nav.generated_at().is_some());
    }

    #[test]
    fn test_full_url_missing_is_hard_failure() {
        let nav = loaded(&site());

        let err = nav.full_url(PageId(7777)).unwrap_err();

        assert!(matches!(err, PagesError::UnresolvedUrl(_)));
    }

    #[test]
    fn test_menu_skips_hidden_and_limits_depth() {
        let store = site();
        seed_with(&store, 1005, 1, 4, "secret", |p| p.hidden = true);
        let nav = loaded(&store);

        let menu = nav.menu(Zone::Page, PageId::HOME, None);
        assert_eq!(ids(&menu), vec![1001, 1002, 2]);
        assert_eq!(ids(&menu[0].children), vec![1003]);

        let shallow = nav.menu(Zone::Page, PageId::HOME, Some(1));
        assert!(shallow[0].children.is_empty());
        assert!(nav.menu(Zone::Page, PageId::HOME, Some(0)).is_empty());
    }

    #[test]
    fn test_tree_view_sections() {
        let store = site();
        seed_with(&store, 1005, 1, 4, "secret", |p| p.hidden = true);
        seed_with(&store, 1006, 0, 1, "legal", |p| p.zone = Zone::Meta);
        seed_with(&store, 1007, 1006, 1, "privacy", |p| p.zone = Zone::Meta);
        seed_with(&store, 1008, 1004, 1, "nested", |p| p.zone = Zone::Footer);
        let nav = loaded(&store);

        let view = nav.tree_view();

        let home = view.home.unwrap();
        assert_eq!(home.entry.tree_type, TreeType::Home);
        assert_eq!(ids(&home.children), vec![1001, 1002, 2, 1005]);
        assert_eq!(ids(&view.meta), vec![1006]);
        assert_eq!(ids(&view.meta[0].children), vec![1007]);
        assert_eq!(ids(&view.footer), vec![1004]);
        assert!(view.footer[0].children.is_empty());
        assert_eq!(ids(&view.root), vec![404]);
    }

    #[test]
    fn test_from_compiled_matches_loaded() {
        let store = site();
        let cache = cache();
        let compiled = NavigationBuilder::new(&store, &cache).rebuild(&en()).unwrap();

        let fresh = NavigationCache::from_compiled(en(), compiled);
        let loaded = NavigationCache::load(&cache, &en()).unwrap().unwrap();

        assert_eq!(fresh.keys(), loaded.keys());
        assert_eq!(fresh.index(), loaded.index());
        assert_eq!(fresh.language(), &en());
    }
}
