//! Page and revision manager.
//!
//! [`PageManager`] is the single entry point for mutating the page tree. It
//! enforces the revision lifecycle (one active row per page and language,
//! drafts replaced per user, bounded archive) and rebuilds the navigation
//! cache at the end of every structural mutation.
//!
//! # Thread Safety
//!
//! All mutations go through one `Mutex<()>`, so sequence shifting and cache
//! rebuilds never interleave. Reads don't take the lock, except for the first
//! navigation lookup of a language whose artifacts are missing or whose last
//! rebuild failed.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arbor_cache::Cache;
use arbor_storage::{
    BlockId, BlockRecord, FileSystem, Language, NewPage, NewTemplate, PageId, PageRecord,
    PageStatus, PageStore, Position, RevisionId, RevisionSummary, TemplateId, TemplateRecord,
};

use crate::compiler::NavigationBuilder;
use crate::error::PagesError;
use crate::navigation::NavigationCache;
use crate::page::apply_reserved_flags;
use crate::reorder::{self, DropKind, active_page};
use crate::template::TemplateGrid;
use crate::url_resolver::{RouteTable, UrlResolver};

/// Pages created by editors get ids above this value.
const USER_PAGE_ID_FLOOR: u32 = 1000;

/// Tunables for [`PageManager`].
#[derive(Clone, Debug)]
pub struct PagesConfig {
    /// Archived revisions kept per page.
    pub max_revisions: usize,
    /// Suffix attempts before URL resolution gives up.
    pub max_url_attempts: u32,
    /// Public web root probed for URL collisions.
    pub web_root: PathBuf,
    /// Prefix public URLs with the language code.
    pub multi_language: bool,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            max_revisions: 20,
            max_url_attempts: 1000,
            web_root: PathBuf::from("www"),
            multi_language: false,
        }
    }
}

/// Orchestrates page, block and template changes.
pub struct PageManager {
    store: Arc<dyn PageStore>,
    cache: Arc<dyn Cache>,
    fs: Arc<dyn FileSystem>,
    routes: RouteTable,
    config: PagesConfig,
    mutations: Mutex<()>,
    /// Languages whose last rebuild failed; their artifacts can't be trusted.
    stale: Mutex<HashSet<Language>>,
}

impl PageManager {
    pub fn new(
        store: Arc<dyn PageStore>,
        cache: Arc<dyn Cache>,
        fs: Arc<dyn FileSystem>,
        routes: RouteTable,
        config: PagesConfig,
    ) -> Self {
        Self {
            store,
            cache,
            fs,
            routes,
            config,
            mutations: Mutex::new(()),
            stale: Mutex::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &PagesConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // Guards no data, so a panic elsewhere leaves nothing inconsistent
        self.mutations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn stale(&self) -> MutexGuard<'_, HashSet<Language>> {
        self.stale.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn rebuild_locked(&self, language: &Language) -> Result<NavigationCache, PagesError> {
        let rebuilt =
            NavigationBuilder::new(self.store.as_ref(), self.cache.as_ref()).rebuild(language);
        match rebuilt {
            Ok(compiled) => {
                self.stale().remove(language);
                Ok(NavigationCache::from_compiled(language.clone(), compiled))
            }
            Err(err) => {
                self.stale().insert(language.clone());
                Err(err)
            }
        }
    }

    /// Cached navigation, unless the last rebuild of `language` failed.
    fn load_trusted(&self, language: &Language) -> Result<Option<NavigationCache>, PagesError> {
        if self.stale().contains(language) {
            return Ok(None);
        }
        NavigationCache::load(self.cache.as_ref(), language)
    }

    /// Rebuild the navigation cache of `language`.
    pub fn rebuild(&self, language: &Language) -> Result<NavigationCache, PagesError> {
        let _guard = self.lock();
        self.rebuild_locked(language)
    }

    /// Insert a new page as its first revision.
    ///
    /// # Errors
    ///
    /// Returns [`PagesError::Validation`] for archive rows or if an active row
    /// already exists for the page and language.
    pub fn insert(&self, page: NewPage) -> Result<RevisionId, PagesError> {
        if page.status == PageStatus::Archive {
            return Err(PagesError::Validation(
                "a page can't be inserted as an archived revision".to_owned(),
            ));
        }

        let _guard = self.lock();
        let (id, language) = (page.id, page.language.clone());
        if page.status == PageStatus::Active
            && self
                .store
                .page_exists(id, &language, &[PageStatus::Active])?
        {
            return Err(PagesError::Validation(format!(
                "page {id} already has an active revision in {language}"
            )));
        }

        let revision_id = self.store.insert_page(page)?;
        self.rebuild_locked(&language)?;
        tracing::info!(
            page_id = %id,
            revision_id = %revision_id,
            language = %language,
            "page inserted"
        );
        Ok(revision_id)
    }

    /// Store a new revision of an existing page.
    ///
    /// A non-draft revision archives the current active row. A draft replaces
    /// the drafts the same user already has for the page. Archived revisions
    /// beyond `max_revisions` are then deleted, oldest first, with their blocks.
    ///
    /// # Errors
    ///
    /// Returns [`PagesError::NotFound`] if the page has neither an active nor
    /// a draft row, [`PagesError::Validation`] for archive rows.
    pub fn update(&self, page: NewPage) -> Result<RevisionId, PagesError> {
        if page.status == PageStatus::Archive {
            return Err(PagesError::Validation(
                "a page can't be updated to an archived revision".to_owned(),
            ));
        }

        let _guard = self.lock();
        let (id, language) = (page.id, page.language.clone());
        if !self
            .store
            .page_exists(id, &language, &[PageStatus::Active, PageStatus::Draft])?
        {
            return Err(PagesError::NotFound(format!("page {id} ({language})")));
        }

        if page.status == PageStatus::Draft {
            let replaced = self.store.delete_drafts(id, &language, page.user_id)?;
            self.store.delete_blocks_for_revisions(&replaced)?;
        } else {
            self.store
                .set_status(id, &language, PageStatus::Active, PageStatus::Archive)?;
        }

        let revision_id = self.store.insert_page(page)?;
        let pruned = self.prune_revisions(id, &language)?;
        self.rebuild_locked(&language)?;
        tracing::info!(
            page_id = %id,
            revision_id = %revision_id,
            language = %language,
            pruned,
            "page updated"
        );
        Ok(revision_id)
    }

    /// Delete archived revisions beyond the retention limit.
    fn prune_revisions(&self, id: PageId, language: &Language) -> Result<usize, PagesError> {
        let expired: Vec<RevisionId> = self
            .store
            .revisions(id, language, PageStatus::Archive)?
            .into_iter()
            .skip(self.config.max_revisions)
            .map(|r| r.revision_id)
            .collect();
        if expired.is_empty() {
            return Ok(0);
        }
        self.store.delete_blocks_for_revisions(&expired)?;
        self.store.delete_revisions(&expired)?;
        tracing::debug!(page_id = %id, revisions = expired.len(), "expired revisions deleted");
        Ok(expired.len())
    }

    /// Move a page relative to another and rebuild the cache.
    ///
    /// See [`DropKind`] for placement rules.
    pub fn move_page(
        &self,
        id: PageId,
        target: PageId,
        kind: DropKind,
        language: &Language,
    ) -> Result<Position, PagesError> {
        let _guard = self.lock();
        let position = reorder::move_page(self.store.as_ref(), id, target, kind, language)?;
        self.rebuild_locked(language)?;
        tracing::info!(
            page_id = %id,
            target = %target,
            kind = %kind,
            language = %language,
            "page moved"
        );
        Ok(position)
    }

    /// Delete a page with every revision, block and meta row.
    ///
    /// Returns `Ok(false)` without touching the store if the page doesn't
    /// exist or may not be deleted (always the case for home and the error
    /// page).
    pub fn delete(&self, id: PageId, language: &Language) -> Result<bool, PagesError> {
        let _guard = self.lock();
        let Some(page) = active_page(self.store.as_ref(), id, language)? else {
            return Ok(false);
        };
        if !page.allow_delete {
            tracing::debug!(page_id = %id, "page is protected from deletion");
            return Ok(false);
        }

        let revisions = self.store.page_revision_ids(id, language)?;
        let meta = self.store.page_meta_ids(id, language)?;
        self.store.delete_meta(&meta)?;
        self.store.delete_blocks_for_revisions(&revisions)?;
        self.store.delete_revisions(&revisions)?;

        self.rebuild_locked(language)?;
        tracing::info!(
            page_id = %id,
            language = %language,
            revisions = revisions.len(),
            "page deleted"
        );
        Ok(true)
    }

    /// Attach blocks to a revision.
    ///
    /// The owning active row's `has_extra` flag is set to whether any block
    /// carries an extra, and the cache is rebuilt if that row exists.
    ///
    /// # Errors
    ///
    /// Returns [`PagesError::Validation`] if `blocks` is empty or spans
    /// several revisions.
    pub fn insert_blocks(
        &self,
        language: &Language,
        blocks: &[BlockRecord],
    ) -> Result<(), PagesError> {
        let revision_id = owning_revision(blocks)?;
        let _guard = self.lock();
        self.store_blocks(language, revision_id, blocks)
    }

    /// Replace blocks, archiving the prior rows with the same ids first.
    ///
    /// # Errors
    ///
    /// Same as [`insert_blocks`](Self::insert_blocks).
    pub fn update_blocks(
        &self,
        language: &Language,
        blocks: &[BlockRecord],
    ) -> Result<(), PagesError> {
        let revision_id = owning_revision(blocks)?;
        let _guard = self.lock();
        let ids: Vec<BlockId> = blocks.iter().map(|b| b.id).collect();
        self.store.archive_blocks(&ids)?;
        self.store_blocks(language, revision_id, blocks)
    }

    fn store_blocks(
        &self,
        language: &Language,
        revision_id: RevisionId,
        blocks: &[BlockRecord],
    ) -> Result<(), PagesError> {
        let has_extra = blocks.iter().any(|b| b.extra_id.is_some());
        let flagged = self.store.set_has_extra(revision_id, has_extra)?;
        self.store.insert_blocks(blocks)?;
        if flagged {
            self.rebuild_locked(language)?;
        }
        tracing::debug!(
            revision_id = %revision_id,
            blocks = blocks.len(),
            has_extra,
            "blocks stored"
        );
        Ok(())
    }

    /// Add a template. Making it the default clears the flag on all others.
    ///
    /// # Errors
    ///
    /// Returns [`PagesError::Validation`] if the layout format can't be parsed.
    pub fn insert_template(&self, template: NewTemplate) -> Result<TemplateId, PagesError> {
        validate_template(&template)?;
        let _guard = self.lock();
        if template.is_default {
            self.store.clear_default_template()?;
        }
        Ok(self.store.insert_template(template)?)
    }

    /// Overwrite a template. Making it the default clears the flag on all others.
    ///
    /// # Errors
    ///
    /// Returns [`PagesError::NotFound`] if the template doesn't exist.
    pub fn update_template(&self, id: TemplateId, template: NewTemplate) -> Result<(), PagesError> {
        validate_template(&template)?;
        let _guard = self.lock();
        if self.store.find_template(id)?.is_none() {
            return Err(PagesError::NotFound(format!("template {id}")));
        }
        if template.is_default {
            self.store.clear_default_template()?;
        }
        self.store.update_template(id, template)?;
        Ok(())
    }

    pub fn get_template(&self, id: TemplateId) -> Result<Option<TemplateRecord>, PagesError> {
        Ok(self.store.find_template(id)?)
    }

    /// Active templates ordered by id.
    pub fn templates(&self) -> Result<Vec<TemplateRecord>, PagesError> {
        Ok(self.store.active_templates()?)
    }

    /// Parsed block layout of a template.
    ///
    /// # Errors
    ///
    /// Returns [`PagesError::NotFound`] for an unknown template and
    /// [`PagesError::Validation`] if it has no usable format.
    pub fn template_grid(&self, id: TemplateId) -> Result<TemplateGrid, PagesError> {
        let template = self
            .store
            .find_template(id)?
            .ok_or_else(|| PagesError::NotFound(format!("template {id}")))?;
        let format = template
            .format
            .as_deref()
            .ok_or_else(|| PagesError::Validation(format!("template {id} has no format")))?;
        TemplateGrid::parse(format, &template.names)
    }

    /// Active row of a page, reserved flags applied.
    pub fn get(&self, id: PageId, language: &Language) -> Result<Option<PageRecord>, PagesError> {
        active_page(self.store.as_ref(), id, language)
    }

    /// A specific revision of a page, reserved flags applied.
    pub fn get_revision(
        &self,
        id: PageId,
        revision_id: RevisionId,
        language: &Language,
    ) -> Result<Option<PageRecord>, PagesError> {
        let mut page = self.store.find_revision(id, revision_id, language)?;
        if let Some(page) = page.as_mut() {
            apply_reserved_flags(page);
        }
        Ok(page)
    }

    /// Whether the page has an active or draft row.
    pub fn exists(&self, id: PageId, language: &Language) -> Result<bool, PagesError> {
        Ok(self
            .store
            .page_exists(id, language, &[PageStatus::Active, PageStatus::Draft])?)
    }

    /// Blocks of the page's active revision.
    pub fn blocks(&self, id: PageId, language: &Language) -> Result<Vec<BlockRecord>, PagesError> {
        let page = self
            .store
            .find_page(id, language, PageStatus::Active)?
            .ok_or_else(|| PagesError::NotFound(format!("page {id} ({language})")))?;
        Ok(self.store.blocks_for_revision(page.revision_id)?)
    }

    /// Blocks of one revision of a page.
    pub fn revision_blocks(
        &self,
        id: PageId,
        revision_id: RevisionId,
        language: &Language,
    ) -> Result<Vec<BlockRecord>, PagesError> {
        if self.store.find_revision(id, revision_id, language)?.is_none() {
            return Err(PagesError::NotFound(format!(
                "revision {revision_id} of page {id} ({language})"
            )));
        }
        Ok(self.store.blocks_for_revision(revision_id)?)
    }

    /// Revisions of a page with a given status, most recently edited first.
    pub fn revisions(
        &self,
        id: PageId,
        language: &Language,
        status: PageStatus,
    ) -> Result<Vec<RevisionSummary>, PagesError> {
        Ok(self.store.revisions(id, language, status)?)
    }

    /// Most recently edited rows of any page.
    pub fn recent(
        &self,
        language: &Language,
        status: PageStatus,
        limit: usize,
    ) -> Result<Vec<RevisionSummary>, PagesError> {
        Ok(self.store.recent(language, status, limit)?)
    }

    pub fn first_child_id(
        &self,
        parent: PageId,
        language: &Language,
    ) -> Result<Option<PageId>, PagesError> {
        Ok(self.store.first_child(parent, language)?)
    }

    /// Id for a new editor-created page, always above the reserved range.
    pub fn next_page_id(&self, language: &Language) -> Result<PageId, PagesError> {
        let max = self.store.max_page_id(language)?.map_or(0, PageId::get);
        Ok(PageId(max.max(USER_PAGE_ID_FLOOR) + 1))
    }

    /// Highest sequence among the active children of `parent` (0 if none).
    pub fn max_sequence(&self, parent: PageId, language: &Language) -> Result<i64, PagesError> {
        Ok(self.store.max_child_sequence(parent, language)?.unwrap_or(0))
    }

    pub fn next_block_id(&self) -> Result<BlockId, PagesError> {
        let max = self.store.max_block_id()?.map_or(0, BlockId::get);
        Ok(BlockId(max + 1))
    }

    /// Find a free URL slug for a page under `parent_id`.
    ///
    /// See [`add_number`](crate::add_number) for the suffix scheme.
    pub fn resolve_url(
        &self,
        candidate: &str,
        page_id: Option<PageId>,
        parent_id: PageId,
        language: &Language,
    ) -> Result<String, PagesError> {
        let parent_url = self.full_url(parent_id, language)?;
        UrlResolver {
            store: self.store.as_ref(),
            fs: self.fs.as_ref(),
            routes: &self.routes,
            web_root: &self.config.web_root,
            max_attempts: self.config.max_url_attempts,
        }
        .resolve(candidate, page_id, parent_id, &parent_url, language)
    }

    /// Public URL of a page: `/{full_url}`, or `/{language}/{full_url}` on
    /// multi-language sites.
    ///
    /// # Errors
    ///
    /// Returns [`PagesError::UnresolvedUrl`] if the page is not in the
    /// navigation cache.
    pub fn full_url(&self, id: PageId, language: &Language) -> Result<String, PagesError> {
        let navigation = self.navigation(language)?;
        let url = navigation.full_url(id)?;
        Ok(if self.config.multi_language {
            format!("/{language}/{url}")
        } else {
            format!("/{url}")
        })
    }

    /// Navigation cache of `language`, built first if it doesn't exist yet or
    /// the last rebuild failed.
    pub fn navigation(&self, language: &Language) -> Result<NavigationCache, PagesError> {
        if let Some(navigation) = self.load_trusted(language)? {
            return Ok(navigation);
        }
        let _guard = self.lock();
        // Another caller may have built it while we waited
        if let Some(navigation) = self.load_trusted(language)? {
            return Ok(navigation);
        }
        tracing::debug!(language = %language, "navigation cache missing, building");
        self.rebuild_locked(language)
    }
}

/// Revision all blocks belong to.
fn owning_revision(blocks: &[BlockRecord]) -> Result<RevisionId, PagesError> {
    let Some(first) = blocks.first() else {
        return Err(PagesError::Validation("block set is empty".to_owned()));
    };
    if blocks.iter().any(|b| b.revision_id != first.revision_id) {
        return Err(PagesError::Validation(
            "blocks belong to different revisions".to_owned(),
        ));
    }
    Ok(first.revision_id)
}

fn validate_template(template: &NewTemplate) -> Result<(), PagesError> {
    if let Some(format) = template.format.as_deref() {
        TemplateGrid::parse(format, &template.names)?;
    }
    Ok(())
}
