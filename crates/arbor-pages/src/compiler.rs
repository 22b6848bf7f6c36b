//! Compiles the active page tree into the navigation cache.
//!
//! Two artifacts are produced per language:
//!
//! - [`UrlMap`]: page id to full URL (`keys_{language}`)
//! - [`NavigationIndex`]: entries grouped by zone and parent (`navigation_{language}`)
//!
//! Both are plain data. They are rebuilt from scratch after every structural
//! change and written to the `navigation` cache bucket with the generation
//! time (Unix seconds) as the entry etag.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use arbor_cache::{Cache, CacheBucketExt};
use arbor_storage::{Language, PageId, PageStore, Zone};
use serde::{Deserialize, Serialize};

use crate::error::PagesError;
use crate::page::TreeType;
use crate::tree_loader::{Forest, load_forest};

/// Cache bucket holding the navigation artifacts.
pub(crate) const BUCKET: &str = "navigation";

pub(crate) fn keys_key(language: &Language) -> String {
    format!("keys_{language}")
}

pub(crate) fn navigation_key(language: &Language) -> String {
    format!("navigation_{language}")
}

/// One page as seen by menus and routing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavigationEntry {
    pub page_id: PageId,
    pub parent_id: PageId,
    #[serde(rename = "type")]
    pub zone: Zone,
    /// Own URL segment (empty for home).
    pub url: String,
    /// Path from the root without leading or trailing slash.
    pub full_url: String,
    pub title: String,
    pub navigation_title: String,
    pub has_extra: bool,
    pub tree_type: TreeType,
}

/// Page id to full URL.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlMap(BTreeMap<PageId, String>);

impl UrlMap {
    pub fn get(&self, id: PageId) -> Option<&str> {
        self.0.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries ordered by URL, then id.
    pub fn sorted_by_url(&self) -> Vec<(PageId, &str)> {
        let mut entries: Vec<(PageId, &str)> =
            self.0.iter().map(|(id, url)| (*id, url.as_str())).collect();
        entries.sort_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(&b.0)));
        entries
    }

    fn insert(&mut self, id: PageId, url: String) {
        self.0.insert(id, url);
    }
}

/// Navigation entries grouped by zone, then by parent id.
///
/// Children keep tree order (sequence ascending). Serialized as a flat list
/// in that same order and regrouped on load.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<NavigationEntry>", from = "Vec<NavigationEntry>")]
pub struct NavigationIndex {
    zones: BTreeMap<Zone, BTreeMap<PageId, Vec<NavigationEntry>>>,
}

impl NavigationIndex {
    /// Children of `parent` in `zone`, in tree order.
    pub fn children(&self, zone: Zone, parent: PageId) -> &[NavigationEntry] {
        self.zones
            .get(&zone)
            .and_then(|parents| parents.get(&parent))
            .map_or(&[], Vec::as_slice)
    }

    /// Find the entry of a page in any zone.
    pub fn entry(&self, id: PageId) -> Option<&NavigationEntry> {
        self.iter().find(|e| e.page_id == id)
    }

    /// Every entry, zone by zone.
    pub fn iter(&self) -> impl Iterator<Item = &NavigationEntry> {
        self.zones.values().flat_map(BTreeMap::values).flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    fn push(&mut self, entry: NavigationEntry) {
        self.zones
            .entry(entry.zone)
            .or_default()
            .entry(entry.parent_id)
            .or_default()
            .push(entry);
    }
}

impl From<Vec<NavigationEntry>> for NavigationIndex {
    fn from(entries: Vec<NavigationEntry>) -> Self {
        let mut index = Self::default();
        for entry in entries {
            index.push(entry);
        }
        index
    }
}

impl From<NavigationIndex> for Vec<NavigationEntry> {
    fn from(index: NavigationIndex) -> Self {
        index
            .zones
            .into_values()
            .flat_map(BTreeMap::into_values)
            .flatten()
            .collect()
    }
}

/// Both artifacts of one compilation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompiledNavigation {
    pub keys: UrlMap,
    pub navigation: NavigationIndex,
}

/// Join a parent URL and a segment without doubled or dangling slashes.
fn join_url(parent: &str, segment: &str) -> String {
    let parent = parent.trim_matches('/');
    let segment = segment.trim_matches('/');
    match (parent.is_empty(), segment.is_empty()) {
        (true, _) => segment.to_owned(),
        (false, true) => parent.to_owned(),
        (false, false) => format!("{parent}/{segment}"),
    }
}

/// Compile a forest into the URL map and navigation index.
///
/// Pages are visited in load order, so a parent's URL is always known before
/// its children are reached. A page whose parent has no URL (root level, or a
/// parent outside the forest) starts from the empty path.
pub fn compile(forest: &Forest) -> CompiledNavigation {
    let mut compiled = CompiledNavigation::default();

    for page in forest.pages() {
        let parent_url = compiled.keys.get(page.parent_id).unwrap_or("");
        let segment = if page.id == PageId::HOME { "" } else { page.url.as_str() };
        let full_url = join_url(parent_url, segment);

        compiled.keys.insert(page.id, full_url.clone());
        compiled.navigation.push(NavigationEntry {
            page_id: page.id,
            parent_id: page.parent_id,
            zone: page.zone,
            url: segment.to_owned(),
            full_url,
            title: page.title.clone(),
            navigation_title: page.navigation_title.clone(),
            has_extra: page.has_extra,
            tree_type: TreeType::classify(page.id, page.hidden),
        });
    }

    compiled
}

/// Current time as Unix seconds.
pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

/// Loads, compiles and persists the navigation cache of one language.
pub struct NavigationBuilder<'a> {
    store: &'a dyn PageStore,
    cache: &'a dyn Cache,
}

impl<'a> NavigationBuilder<'a> {
    pub fn new(store: &'a dyn PageStore, cache: &'a dyn Cache) -> Self {
        Self { store, cache }
    }

    /// Rebuild both artifacts for `language`, replacing previous ones.
    ///
    /// On failure both artifacts are dropped, so readers find no cache
    /// instead of one describing the tree before the mutation.
    ///
    /// # Errors
    ///
    /// Returns [`PagesError::Persistence`] if the tree can't be loaded or an
    /// artifact can't be written. The caller must treat its mutation as
    /// failed in that case.
    pub fn rebuild(&self, language: &Language) -> Result<CompiledNavigation, PagesError> {
        let result = self.compile_and_write(language);
        if let Err(err) = &result {
            tracing::warn!(language = %language, error = %err, "navigation rebuild failed");
            self.invalidate(language);
        }
        result
    }

    /// Remove both artifacts of `language`. Failures are logged only.
    pub fn invalidate(&self, language: &Language) {
        let bucket = self.cache.bucket(BUCKET);
        for key in [keys_key(language), navigation_key(language)] {
            if let Err(e) = bucket.remove(&key) {
                tracing::warn!(key = %key, "failed to drop navigation artifact: {e}");
            }
        }
    }

    fn compile_and_write(&self, language: &Language) -> Result<CompiledNavigation, PagesError> {
        let forest = load_forest(self.store, &[PageId::ROOT], language)?;
        let compiled = compile(&forest);
        let generated_at = unix_now().to_string();

        let bucket = self.cache.bucket(BUCKET);
        bucket.set_json(&keys_key(language), &generated_at, &compiled.keys)?;
        bucket.set_json(&navigation_key(language), &generated_at, &compiled.navigation)?;

        tracing::info!(
            language = %language,
            pages = compiled.keys.len(),
            levels = forest.depth(),
            "navigation cache rebuilt"
        );
        Ok(compiled)
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use arbor_cache::FileCache;
    use arbor_storage::{FileSystem, MemoryStore, MockFileSystem};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::{en, seed, seed_with, site};

    fn compiled(store: &MemoryStore) -> CompiledNavigation {
        compile(&load_forest(store, &[PageId::ROOT], &en()).unwrap())
    }

    #[test]
    fn test_full_urls_follow_parent_chain() {
        let nav = compiled(&site());

        assert_eq!(nav.keys.get(PageId::HOME), Some(""));
        assert_eq!(nav.keys.get(PageId(1001)), Some("about"));
        assert_eq!(nav.keys.get(PageId(1003)), Some("about/team"));
        assert_eq!(nav.keys.get(PageId::SITEMAP), Some("sitemap"));
        assert_eq!(nav.keys.get(PageId::ERROR), Some("404"));
        assert_eq!(nav.keys.get(PageId(1004)), Some("disclaimer"));
        assert_eq!(nav.keys.get(PageId(9999)), None);
    }

    #[test]
    fn test_about_under_home_scenario() {
        let store = site();
        seed(&store, 1010, 1, 9, "contact");

        let nav = compiled(&store);
        let entry = nav.navigation.entry(PageId(1010)).unwrap();

        assert_eq!(entry.parent_id, PageId::HOME);
        assert_eq!(entry.tree_type, TreeType::Page);
        assert_eq!(entry.full_url, "contact");
        let about = nav.navigation.entry(PageId(1001)).unwrap();
        assert_eq!(about.full_url, "about");
    }

    #[test]
    fn test_no_duplicate_separators() {
        let store = MemoryStore::new();
        seed(&store, 1, 0, 1, "/");
        seed(&store, 1001, 1, 1, "/news/");
        seed(&store, 1002, 1001, 1, "2024/");

        let nav = compiled(&store);

        assert_eq!(nav.keys.get(PageId(1001)), Some("news"));
        assert_eq!(nav.keys.get(PageId(1002)), Some("news/2024"));
    }

    #[test]
    fn test_tree_types_and_grouping() {
        let store = site();
        seed_with(&store, 1005, 1, 4, "secret", |p| p.hidden = true);

        let nav = compiled(&store);
        let home_children: Vec<(u32, TreeType)> = nav
            .navigation
            .children(Zone::Page, PageId::HOME)
            .iter()
            .map(|e| (e.page_id.get(), e.tree_type))
            .collect();

        assert_eq!(
            home_children,
            vec![
                (1001, TreeType::Page),
                (1002, TreeType::Page),
                (2, TreeType::Sitemap),
                (1005, TreeType::Hidden),
            ]
        );
        assert_eq!(
            nav.navigation.children(Zone::Root, PageId::ROOT)[0].tree_type,
            TreeType::Error
        );
        assert_eq!(nav.navigation.children(Zone::Page, PageId::ROOT)[0].tree_type, TreeType::Home);
        assert_eq!(nav.navigation.children(Zone::Page, PageId::ROOT)[0].url, "");
        assert!(nav.navigation.children(Zone::Meta, PageId::ROOT).is_empty());
        assert_eq!(nav.navigation.len(), 8);
    }

    #[test]
    fn test_sorted_by_url() {
        let nav = compiled(&site());

        let urls: Vec<&str> = nav.keys.sorted_by_url().into_iter().map(|(_, u)| u).collect();

        assert_eq!(
            urls,
            vec!["", "404", "about", "about/team", "blog", "disclaimer", "sitemap"]
        );
    }

    #[test]
    fn test_navigation_index_round_trips_through_json() {
        let nav = compiled(&site());

        let json = serde_json::to_string(&nav.navigation).unwrap();
        let decoded: NavigationIndex = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, nav.navigation);
    }

    #[test]
    fn test_rebuild_writes_both_artifacts() {
        let store = site();
        let fs = Arc::new(MockFileSystem::new());
        let cache = FileCache::new(
            Arc::clone(&fs) as Arc<dyn FileSystem>,
            PathBuf::from("cache"),
            "v1",
        );

        let nav = NavigationBuilder::new(&store, &cache).rebuild(&en()).unwrap();

        let bucket = cache.bucket(BUCKET);
        assert_eq!(bucket.keys().unwrap(), vec!["keys_en", "navigation_en"]);
        let keys: UrlMap = bucket.get_json("keys_en", "").unwrap().unwrap();
        assert_eq!(keys, nav.keys);
        let generated: i64 = bucket.etag("keys_en").unwrap().unwrap().parse().unwrap();
        assert!(generated > 0);
        assert!(fs.exists(Path::new("cache/navigation/navigation_en")));
    }

    #[test]
    fn test_rebuild_replaces_previous_artifacts() {
        let store = site();
        let tmp = tempfile::tempdir().unwrap();
        let cache = FileCache::new(
            Arc::new(arbor_storage::FsGateway::new()),
            tmp.path().join("cache"),
            "v1",
        );
        let builder = NavigationBuilder::new(&store, &cache);
        builder.rebuild(&en()).unwrap();

        seed(&store, 1010, 1, 9, "contact");
        builder.rebuild(&en()).unwrap();

        let keys: UrlMap = cache.bucket(BUCKET).get_json("keys_en", "").unwrap().unwrap();
        assert_eq!(keys.get(PageId(1010)), Some("contact"));
        assert_eq!(keys.len(), 8);
    }

    #[test]
    fn test_rebuild_write_failure_propagates() {
        let store = site();
        let fs = Arc::new(MockFileSystem::new());
        let cache = FileCache::new(
            Arc::clone(&fs) as Arc<dyn FileSystem>,
            PathBuf::from("cache"),
            "v1",
        );
        fs.fail_writes(true);

        let err = NavigationBuilder::new(&store, &cache).rebuild(&en()).unwrap_err();

        assert!(matches!(err, PagesError::Persistence(_)), "{err:?}");
    }

    #[test]
    fn test_failed_rebuild_drops_previous_artifacts() {
        let store = site();
        let fs = Arc::new(MockFileSystem::new());
        let cache = FileCache::new(
            Arc::clone(&fs) as Arc<dyn FileSystem>,
            PathBuf::from("cache"),
            "v1",
        );
        let builder = NavigationBuilder::new(&store, &cache);
        builder.rebuild(&en()).unwrap();
        assert!(fs.exists(Path::new("cache/navigation/keys_en")));

        fs.fail_writes(true);
        builder.rebuild(&en()).unwrap_err();

        assert!(cache.bucket(BUCKET).keys().unwrap().is_empty());
    }
}
