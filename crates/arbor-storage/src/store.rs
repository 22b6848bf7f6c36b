//! The [`PageStore`] gateway trait.
//!
//! Each method corresponds to one parameterized query against the page
//! tables. Implementations must execute each call atomically; callers
//! serialize multi-call mutations themselves.

use crate::error::StorageError;
use crate::records::{
    BlockId, BlockRecord, Language, MetaId, MetaRecord, NewMeta, NewPage, NewTemplate, PageId,
    PageRecord, PageStatus, PageSummary, RevisionId, RevisionSummary, TemplateId, TemplateRecord,
    UserId, Zone,
};

/// New tree position for a moved page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub parent_id: PageId,
    pub sequence: i64,
    pub zone: Zone,
}

/// Relational store holding pages, meta rows, blocks and templates.
pub trait PageStore: Send + Sync {
    /// Active pages of `language` whose parent is one of `parents`, joined
    /// with their meta URL, ordered by sequence ascending.
    fn active_children(
        &self,
        parents: &[PageId],
        language: &Language,
    ) -> Result<Vec<PageSummary>, StorageError>;

    /// Most recent row of a page with the given status.
    fn find_page(
        &self,
        id: PageId,
        language: &Language,
        status: PageStatus,
    ) -> Result<Option<PageRecord>, StorageError>;

    /// A specific revision of a page.
    fn find_revision(
        &self,
        id: PageId,
        revision_id: RevisionId,
        language: &Language,
    ) -> Result<Option<PageRecord>, StorageError>;

    /// Whether any row of the page has one of `statuses`.
    fn page_exists(
        &self,
        id: PageId,
        language: &Language,
        statuses: &[PageStatus],
    ) -> Result<bool, StorageError>;

    /// Insert a page row and return its newly assigned revision id.
    fn insert_page(&self, page: NewPage) -> Result<RevisionId, StorageError>;

    /// Change the status of every `from` row of a page to `to`.
    ///
    /// Returns the number of rows changed.
    fn set_status(
        &self,
        id: PageId,
        language: &Language,
        from: PageStatus,
        to: PageStatus,
    ) -> Result<usize, StorageError>;

    /// Delete the draft rows a user owns for a page, returning their revision ids.
    fn delete_drafts(
        &self,
        id: PageId,
        language: &Language,
        user_id: UserId,
    ) -> Result<Vec<RevisionId>, StorageError>;

    /// Revisions of a page with the given status, most recently edited first.
    fn revisions(
        &self,
        id: PageId,
        language: &Language,
        status: PageStatus,
    ) -> Result<Vec<RevisionSummary>, StorageError>;

    /// Most recently edited rows of any page with the given status.
    fn recent(
        &self,
        language: &Language,
        status: PageStatus,
        limit: usize,
    ) -> Result<Vec<RevisionSummary>, StorageError>;

    /// Every revision id of a page, whatever its status.
    fn page_revision_ids(
        &self,
        id: PageId,
        language: &Language,
    ) -> Result<Vec<RevisionId>, StorageError>;

    /// Every meta id referenced by any revision of a page.
    fn page_meta_ids(&self, id: PageId, language: &Language)
    -> Result<Vec<MetaId>, StorageError>;

    /// Delete page rows by revision id. Returns the number of rows removed.
    fn delete_revisions(&self, revisions: &[RevisionId]) -> Result<usize, StorageError>;

    /// Count active siblings under `parent_id` whose URL equals `url`,
    /// ignoring `exclude` when given.
    fn count_sibling_urls(
        &self,
        parent_id: PageId,
        language: &Language,
        url: &str,
        exclude: Option<PageId>,
    ) -> Result<usize, StorageError>;

    /// Highest sequence among the active children of `parent_id`.
    fn max_child_sequence(
        &self,
        parent_id: PageId,
        language: &Language,
    ) -> Result<Option<i64>, StorageError>;

    /// Add one to the sequence of every active child of `parent_id` whose
    /// sequence is at least `from`, skipping `exclude`.
    ///
    /// Returns the number of rows shifted.
    fn shift_sequences(
        &self,
        parent_id: PageId,
        language: &Language,
        from: i64,
        exclude: PageId,
    ) -> Result<usize, StorageError>;

    /// Rewrite parent, sequence and zone of the active row in place.
    ///
    /// Returns `false` if the page has no active row.
    fn update_position(
        &self,
        id: PageId,
        language: &Language,
        position: Position,
    ) -> Result<bool, StorageError>;

    /// Set the `has_extra` flag of the active row with this revision id.
    fn set_has_extra(&self, revision_id: RevisionId, has_extra: bool)
    -> Result<bool, StorageError>;

    /// First active child of `parent_id` by sequence.
    fn first_child(
        &self,
        parent_id: PageId,
        language: &Language,
    ) -> Result<Option<PageId>, StorageError>;

    /// Highest page id used in a language.
    fn max_page_id(&self, language: &Language) -> Result<Option<PageId>, StorageError>;

    /// Insert a meta row and return its id.
    fn insert_meta(&self, meta: NewMeta) -> Result<MetaId, StorageError>;

    /// Fetch a meta row.
    fn find_meta(&self, id: MetaId) -> Result<Option<MetaRecord>, StorageError>;

    /// Delete meta rows. Returns the number of rows removed.
    fn delete_meta(&self, ids: &[MetaId]) -> Result<usize, StorageError>;

    /// Insert content blocks.
    fn insert_blocks(&self, blocks: &[BlockRecord]) -> Result<(), StorageError>;

    /// Mark every active block with one of `ids` as archived.
    fn archive_blocks(&self, ids: &[BlockId]) -> Result<usize, StorageError>;

    /// Blocks of one revision.
    fn blocks_for_revision(&self, revision_id: RevisionId)
    -> Result<Vec<BlockRecord>, StorageError>;

    /// Delete the blocks of the given revisions. Returns the number removed.
    fn delete_blocks_for_revisions(&self, revisions: &[RevisionId])
    -> Result<usize, StorageError>;

    /// Highest block id in use.
    fn max_block_id(&self) -> Result<Option<BlockId>, StorageError>;

    /// Insert a template and return its id.
    fn insert_template(&self, template: NewTemplate) -> Result<TemplateId, StorageError>;

    /// Overwrite a template. Returns `false` if it doesn't exist.
    fn update_template(&self, id: TemplateId, template: NewTemplate)
    -> Result<bool, StorageError>;

    /// Clear the default flag on every template.
    fn clear_default_template(&self) -> Result<(), StorageError>;

    /// Fetch a template.
    fn find_template(&self, id: TemplateId) -> Result<Option<TemplateRecord>, StorageError>;

    /// All active templates ordered by id.
    fn active_templates(&self) -> Result<Vec<TemplateRecord>, StorageError>;
}
