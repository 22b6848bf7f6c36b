//! Collision-free URL slugs.
//!
//! A candidate slug is checked against three sources in turn:
//!
//! 1. active siblings with the same slug in the store
//! 2. an existing file or directory at `{web_root}/{full path}`
//! 3. the static application route table
//!
//! Any collision bumps the numeric suffix (`page`, `page-2`, `page-3`, ...)
//! and starts over. The loop is bounded; running out of attempts is an error.

use std::collections::HashSet;
use std::path::Path;

use arbor_storage::{FileSystem, Language, PageId, PageStore};

use crate::error::PagesError;

/// Statically registered application routes.
///
/// Paths are stored without leading or trailing slashes.
#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    routes: HashSet<String>,
}

impl RouteTable {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            routes: paths
                .into_iter()
                .map(|p| p.as_ref().trim_matches('/').to_owned())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Whether `path` (slashes at either end ignored) is a registered route.
    pub fn contains(&self, path: &str) -> bool {
        self.routes.contains(path.trim_matches('/'))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Bump the numeric suffix of a slug.
///
/// A slug already ending in `-N` gets `N + 1`; anything else gets `-2`.
///
/// ```
/// use arbor_pages::add_number;
///
/// assert_eq!(add_number("about"), "about-2");
/// assert_eq!(add_number("about-2"), "about-3");
/// assert_eq!(add_number("2024"), "2024-2");
/// ```
pub fn add_number(slug: &str) -> String {
    if let Some((base, suffix)) = slug.rsplit_once('-')
        && !base.is_empty()
        && !suffix.is_empty()
        && suffix.bytes().all(|b| b.is_ascii_digit())
        && let Ok(n) = suffix.parse::<u64>()
    {
        return format!("{base}-{}", n.saturating_add(1));
    }
    format!("{slug}-2")
}

/// Why a candidate was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Collision {
    Sibling,
    FileSystem,
    Route,
}

/// Finds a free slug for a page under a given parent.
pub(crate) struct UrlResolver<'a> {
    pub(crate) store: &'a dyn PageStore,
    pub(crate) fs: &'a dyn FileSystem,
    pub(crate) routes: &'a RouteTable,
    pub(crate) web_root: &'a Path,
    pub(crate) max_attempts: u32,
}

impl UrlResolver<'_> {
    /// Resolve `candidate` to a slug free under `parent_id`.
    ///
    /// `parent_url` is the parent's public URL (as produced by
    /// [`PageManager::full_url`](crate::PageManager::full_url)). `page_id`
    /// names the page being edited so its own current slug doesn't count
    /// as a collision.
    ///
    /// # Errors
    ///
    /// - [`PagesError::Validation`] if the candidate is empty
    /// - [`PagesError::UnresolvedUrl`] if every attempt collides
    /// - [`PagesError::Persistence`] if the sibling query fails
    pub(crate) fn resolve(
        &self,
        candidate: &str,
        page_id: Option<PageId>,
        parent_id: PageId,
        parent_url: &str,
        language: &Language,
    ) -> Result<String, PagesError> {
        let mut slug = candidate.trim_matches('/').to_owned();
        if slug.is_empty() {
            return Err(PagesError::Validation("URL candidate is empty".to_owned()));
        }

        for _ in 0..=self.max_attempts {
            match self.collision(&slug, page_id, parent_id, parent_url, language)? {
                None => return Ok(slug),
                Some(reason) => {
                    tracing::debug!(slug = %slug, reason = ?reason, "URL taken, adding suffix");
                    slug = add_number(&slug);
                }
            }
        }

        Err(PagesError::UnresolvedUrl(format!(
            "no free URL for {candidate:?} under page {parent_id} after {} attempts",
            self.max_attempts
        )))
    }

    fn collision(
        &self,
        slug: &str,
        page_id: Option<PageId>,
        parent_id: PageId,
        parent_url: &str,
        language: &Language,
    ) -> Result<Option<Collision>, PagesError> {
        if self
            .store
            .count_sibling_urls(parent_id, language, slug, page_id)?
            > 0
        {
            return Ok(Some(Collision::Sibling));
        }

        let full_path = format!("{}/{slug}", parent_url.trim_end_matches('/'));
        let relative = full_path.trim_matches('/');
        if self.fs.exists(&self.web_root.join(relative)) {
            return Ok(Some(Collision::FileSystem));
        }
        if self.routes.contains(relative) {
            return Ok(Some(Collision::Route));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use arbor_storage::{MemoryStore, MockFileSystem};

    use super::*;
    use crate::testing::{en, seed, site};

    struct Fixture {
        store: MemoryStore,
        fs: MockFileSystem,
        routes: RouteTable,
        web_root: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: site(),
                fs: MockFileSystem::new(),
                routes: RouteTable::default(),
                web_root: PathBuf::from("www"),
            }
        }

        fn resolve(
            &self,
            candidate: &str,
            page_id: Option<u32>,
            parent: u32,
            parent_url: &str,
        ) -> Result<String, PagesError> {
            self.resolve_bounded(candidate, page_id, parent, parent_url, 1000)
        }

        fn resolve_bounded(
            &self,
            candidate: &str,
            page_id: Option<u32>,
            parent: u32,
            parent_url: &str,
            max_attempts: u32,
        ) -> Result<String, PagesError> {
            UrlResolver {
                store: &self.store,
                fs: &self.fs,
                routes: &self.routes,
                web_root: &self.web_root,
                max_attempts,
            }
            .resolve(candidate, page_id.map(PageId), PageId(parent), parent_url, &en())
        }
    }

    #[test]
    fn test_add_number() {
        assert_eq!(add_number("page"), "page-2");
        assert_eq!(add_number("page-2"), "page-3");
        assert_eq!(add_number("page-9"), "page-10");
        assert_eq!(add_number("a-b"), "a-b-2");
        assert_eq!(add_number("-3"), "-3-2");
        assert_eq!(add_number("page-"), "page--2");
    }

    #[test]
    fn test_free_candidate_is_kept() {
        let fx = Fixture::new();

        assert_eq!(fx.resolve("contact", None, 1, "/").unwrap(), "contact");
    }

    #[test]
    fn test_sibling_collision_suffixes_deterministically() {
        let fx = Fixture::new();
        seed(&fx.store, 1010, 1, 9, "blog-2");

        let first = fx.resolve("blog", None, 1, "/").unwrap();
        let second = fx.resolve("blog", None, 1, "/").unwrap();

        assert_eq!(first, "blog-3");
        assert_eq!(second, first);
    }

    #[test]
    fn test_suffix_sequence() {
        let fx = Fixture::new();
        seed(&fx.store, 1010, 1, 9, "page");
        assert_eq!(fx.resolve("page", None, 1, "/").unwrap(), "page-2");

        seed(&fx.store, 1011, 1, 10, "page-2");
        assert_eq!(fx.resolve("page", None, 1, "/").unwrap(), "page-3");
    }

    #[test]
    fn test_own_slug_is_not_a_collision() {
        let fx = Fixture::new();

        assert_eq!(fx.resolve("about", Some(1001), 1, "/").unwrap(), "about");
        assert_eq!(fx.resolve("about", Some(1002), 1, "/").unwrap(), "about-2");
    }

    #[test]
    fn test_same_slug_under_other_parent_is_free() {
        let fx = Fixture::new();

        assert_eq!(fx.resolve("blog", None, 1001, "/about").unwrap(), "blog");
    }

    #[test]
    fn test_filesystem_collision() {
        let mut fx = Fixture::new();
        fx.fs = MockFileSystem::new()
            .with_dir("www/about/files")
            .with_file("www/robots.txt", "");

        assert_eq!(fx.resolve("files", None, 1001, "/about").unwrap(), "files-2");
        assert_eq!(fx.resolve("robots.txt", None, 1, "/").unwrap(), "robots.txt-2");
    }

    #[test]
    fn test_route_collision() {
        let mut fx = Fixture::new();
        fx.routes = RouteTable::new(["/backend/", "api/v1"]);

        assert_eq!(fx.resolve("backend", None, 1, "/").unwrap(), "backend-2");
        assert_eq!(fx.resolve("v1", None, 1, "/api").unwrap(), "v1-2");
        assert_eq!(fx.routes.len(), 2);
    }

    #[test]
    fn test_language_prefixed_parent_url() {
        let mut fx = Fixture::new();
        fx.fs = MockFileSystem::new().with_dir("www/en/about/team");

        assert_eq!(fx.resolve("team", Some(1003), 1001, "/en/about").unwrap(), "team-2");
    }

    #[test]
    fn test_bounded_attempts() {
        let fx = Fixture::new();
        seed(&fx.store, 1010, 1, 9, "x");
        seed(&fx.store, 1011, 1, 10, "x-2");
        seed(&fx.store, 1012, 1, 11, "x-3");

        let err = fx.resolve_bounded("x", None, 1, "/", 2).unwrap_err();
        assert!(matches!(err, PagesError::UnresolvedUrl(_)));

        assert_eq!(fx.resolve_bounded("x", None, 1, "/", 3).unwrap(), "x-4");
    }

    #[test]
    fn test_empty_candidate_rejected() {
        let fx = Fixture::new();

        assert!(matches!(fx.resolve("//", None, 1, "/"), Err(PagesError::Validation(_))));
    }
}
