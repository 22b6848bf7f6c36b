//! In-memory [`PageStore`] with JSON snapshot persistence.
//!
//! All tables sit behind one `RwLock`, so every trait call is atomic with
//! respect to other calls. Snapshots are written through a [`FileSystem`]
//! gateway so the on-disk copy is replaced atomically.

use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageErrorKind};
use crate::fs::FileSystem;
use crate::records::{
    BlockId, BlockRecord, BlockStatus, Language, MetaId, MetaRecord, NewMeta, NewPage,
    NewTemplate, PageId, PageRecord, PageStatus, PageSummary, RevisionId, RevisionSummary,
    TemplateId, TemplateRecord, UserId,
};
use crate::store::{PageStore, Position};

/// Backend identifier for error messages.
const BACKEND: &str = "memory store";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Tables {
    pages: Vec<PageRecord>,
    meta: Vec<MetaRecord>,
    blocks: Vec<BlockRecord>,
    templates: Vec<TemplateRecord>,
    next_revision: u64,
    next_meta: u64,
    next_template: u32,
}

impl Tables {
    fn meta_url(&self, id: MetaId) -> Option<&str> {
        self.meta
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.url.as_str())
    }
}

fn summary(page: &PageRecord) -> RevisionSummary {
    RevisionSummary {
        id: page.id,
        revision_id: page.revision_id,
        user_id: page.user_id,
        title: page.title.clone(),
        edited_on: page.edited_on,
    }
}

/// Most recently edited first, newest revision breaking ties.
fn by_edited_desc(a: &RevisionSummary, b: &RevisionSummary) -> std::cmp::Ordering {
    b.edited_on
        .cmp(&a.edited_on)
        .then(b.revision_id.cmp(&a.revision_id))
}

/// In-memory page store.
///
/// # Example
///
/// ```
/// use arbor_storage::{Language, MemoryStore, NewMeta, PageStore};
///
/// let store = MemoryStore::new();
/// let meta_id = store
///     .insert_meta(NewMeta { url: "about".into(), ..Default::default() })
///     .unwrap();
/// assert_eq!(store.find_meta(meta_id).unwrap().unwrap().url, "about");
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot, or start empty if none exists at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorKind::Corrupt`] if the snapshot can't be decoded,
    /// or the gateway's error if it can't be read.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self, StorageError> {
        if !fs.exists(path) {
            tracing::debug!(path = %path.display(), "no snapshot found, starting empty");
            return Ok(Self::new());
        }
        let bytes = fs.read_all(path)?;
        let tables: Tables = serde_json::from_slice(&bytes).map_err(|e| {
            StorageError::new(StorageErrorKind::Corrupt)
                .with_backend(BACKEND)
                .with_path(path)
                .with_source(e)
        })?;
        tracing::debug!(
            path = %path.display(),
            pages = tables.pages.len(),
            "snapshot loaded"
        );
        Ok(Self {
            tables: RwLock::new(tables),
        })
    }

    /// Write a snapshot of every table to `path`.
    ///
    /// # Errors
    ///
    /// Returns the gateway's error if the snapshot can't be written.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn save(&self, fs: &dyn FileSystem, path: &Path) -> Result<(), StorageError> {
        let bytes = {
            let tables = self.tables.read().unwrap();
            serde_json::to_vec_pretty(&*tables).map_err(|e| {
                StorageError::new(StorageErrorKind::Other)
                    .with_backend(BACKEND)
                    .with_source(e)
            })?
        };
        fs.write_all(path, &bytes)
    }

    /// Copy of every page row, in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn page_rows(&self) -> Vec<PageRecord> {
        self.tables.read().unwrap().pages.clone()
    }

    /// Copy of every block row, in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn block_rows(&self) -> Vec<BlockRecord> {
        self.tables.read().unwrap().blocks.clone()
    }

    /// Copy of every meta row.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn meta_rows(&self) -> Vec<MetaRecord> {
        self.tables.read().unwrap().meta.clone()
    }
}

impl PageStore for MemoryStore {
    fn active_children(
        &self,
        parents: &[PageId],
        language: &Language,
    ) -> Result<Vec<PageSummary>, StorageError> {
        let tables = self.tables.read().unwrap();
        let mut rows: Vec<PageSummary> = tables
            .pages
            .iter()
            .filter(|p| {
                p.status == PageStatus::Active
                    && &p.language == language
                    && parents.contains(&p.parent_id)
            })
            // Inner join: pages without a meta row are not part of the tree
            .filter_map(|p| {
                let url = tables.meta_url(p.meta_id)?;
                Some(PageSummary {
                    id: p.id,
                    parent_id: p.parent_id,
                    sequence: p.sequence,
                    zone: p.zone,
                    title: p.title.clone(),
                    navigation_title: p.navigation_title.clone(),
                    hidden: p.hidden,
                    has_extra: p.has_extra,
                    url: url.to_owned(),
                })
            })
            .collect();
        // Stable sort keeps insertion order for equal sequences
        rows.sort_by_key(|p| p.sequence);
        Ok(rows)
    }

    fn find_page(
        &self,
        id: PageId,
        language: &Language,
        status: PageStatus,
    ) -> Result<Option<PageRecord>, StorageError> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .pages
            .iter()
            .filter(|p| p.id == id && &p.language == language && p.status == status)
            .max_by_key(|p| (p.edited_on, p.revision_id))
            .cloned())
    }

    fn find_revision(
        &self,
        id: PageId,
        revision_id: RevisionId,
        language: &Language,
    ) -> Result<Option<PageRecord>, StorageError> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .pages
            .iter()
            .find(|p| p.id == id && p.revision_id == revision_id && &p.language == language)
            .cloned())
    }

    fn page_exists(
        &self,
        id: PageId,
        language: &Language,
        statuses: &[PageStatus],
    ) -> Result<bool, StorageError> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .pages
            .iter()
            .any(|p| p.id == id && &p.language == language && statuses.contains(&p.status)))
    }

    fn insert_page(&self, page: NewPage) -> Result<RevisionId, StorageError> {
        let mut tables = self.tables.write().unwrap();
        tables.next_revision += 1;
        let revision_id = RevisionId(tables.next_revision);
        tables.pages.push(page.into_record(revision_id));
        Ok(revision_id)
    }

    fn set_status(
        &self,
        id: PageId,
        language: &Language,
        from: PageStatus,
        to: PageStatus,
    ) -> Result<usize, StorageError> {
        let mut tables = self.tables.write().unwrap();
        let mut changed = 0;
        for page in tables
            .pages
            .iter_mut()
            .filter(|p| p.id == id && &p.language == language && p.status == from)
        {
            page.status = to;
            changed += 1;
        }
        Ok(changed)
    }

    fn delete_drafts(
        &self,
        id: PageId,
        language: &Language,
        user_id: UserId,
    ) -> Result<Vec<RevisionId>, StorageError> {
        let mut tables = self.tables.write().unwrap();
        let mut removed = Vec::new();
        tables.pages.retain(|p| {
            let is_draft = p.id == id
                && &p.language == language
                && p.user_id == user_id
                && p.status == PageStatus::Draft;
            if is_draft {
                removed.push(p.revision_id);
            }
            !is_draft
        });
        Ok(removed)
    }

    fn revisions(
        &self,
        id: PageId,
        language: &Language,
        status: PageStatus,
    ) -> Result<Vec<RevisionSummary>, StorageError> {
        let tables = self.tables.read().unwrap();
        let mut rows: Vec<RevisionSummary> = tables
            .pages
            .iter()
            .filter(|p| p.id == id && &p.language == language && p.status == status)
            .map(summary)
            .collect();
        rows.sort_by(by_edited_desc);
        Ok(rows)
    }

    fn recent(
        &self,
        language: &Language,
        status: PageStatus,
        limit: usize,
    ) -> Result<Vec<RevisionSummary>, StorageError> {
        let tables = self.tables.read().unwrap();
        let mut rows: Vec<RevisionSummary> = tables
            .pages
            .iter()
            .filter(|p| &p.language == language && p.status == status)
            .map(summary)
            .collect();
        rows.sort_by(by_edited_desc);
        rows.truncate(limit);
        Ok(rows)
    }

    fn page_revision_ids(
        &self,
        id: PageId,
        language: &Language,
    ) -> Result<Vec<RevisionId>, StorageError> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .pages
            .iter()
            .filter(|p| p.id == id && &p.language == language)
            .map(|p| p.revision_id)
            .collect())
    }

    fn page_meta_ids(
        &self,
        id: PageId,
        language: &Language,
    ) -> Result<Vec<MetaId>, StorageError> {
        let tables = self.tables.read().unwrap();
        let mut ids: Vec<MetaId> = tables
            .pages
            .iter()
            .filter(|p| p.id == id && &p.language == language)
            .map(|p| p.meta_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    fn delete_revisions(&self, revisions: &[RevisionId]) -> Result<usize, StorageError> {
        let mut tables = self.tables.write().unwrap();
        let before = tables.pages.len();
        tables.pages.retain(|p| !revisions.contains(&p.revision_id));
        Ok(before - tables.pages.len())
    }

    fn count_sibling_urls(
        &self,
        parent_id: PageId,
        language: &Language,
        url: &str,
        exclude: Option<PageId>,
    ) -> Result<usize, StorageError> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .pages
            .iter()
            .filter(|p| {
                p.parent_id == parent_id
                    && &p.language == language
                    && p.status == PageStatus::Active
                    && exclude != Some(p.id)
            })
            .filter(|p| tables.meta_url(p.meta_id) == Some(url))
            .count())
    }

    fn max_child_sequence(
        &self,
        parent_id: PageId,
        language: &Language,
    ) -> Result<Option<i64>, StorageError> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .pages
            .iter()
            .filter(|p| {
                p.parent_id == parent_id
                    && &p.language == language
                    && p.status == PageStatus::Active
            })
            .map(|p| p.sequence)
            .max())
    }

    fn shift_sequences(
        &self,
        parent_id: PageId,
        language: &Language,
        from: i64,
        exclude: PageId,
    ) -> Result<usize, StorageError> {
        let mut tables = self.tables.write().unwrap();
        let mut shifted = 0;
        for page in tables.pages.iter_mut().filter(|p| {
            p.parent_id == parent_id
                && &p.language == language
                && p.status == PageStatus::Active
                && p.sequence >= from
                && p.id != exclude
        }) {
            page.sequence += 1;
            shifted += 1;
        }
        Ok(shifted)
    }

    fn update_position(
        &self,
        id: PageId,
        language: &Language,
        position: Position,
    ) -> Result<bool, StorageError> {
        let mut tables = self.tables.write().unwrap();
        let mut updated = false;
        for page in tables.pages.iter_mut().filter(|p| {
            p.id == id && &p.language == language && p.status == PageStatus::Active
        }) {
            page.parent_id = position.parent_id;
            page.sequence = position.sequence;
            page.zone = position.zone;
            updated = true;
        }
        Ok(updated)
    }

    fn set_has_extra(
        &self,
        revision_id: RevisionId,
        has_extra: bool,
    ) -> Result<bool, StorageError> {
        let mut tables = self.tables.write().unwrap();
        let mut updated = false;
        for page in tables
            .pages
            .iter_mut()
            .filter(|p| p.revision_id == revision_id && p.status == PageStatus::Active)
        {
            page.has_extra = has_extra;
            updated = true;
        }
        Ok(updated)
    }

    fn first_child(
        &self,
        parent_id: PageId,
        language: &Language,
    ) -> Result<Option<PageId>, StorageError> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .pages
            .iter()
            .filter(|p| {
                p.parent_id == parent_id
                    && &p.language == language
                    && p.status == PageStatus::Active
            })
            .min_by_key(|p| p.sequence)
            .map(|p| p.id))
    }

    fn max_page_id(&self, language: &Language) -> Result<Option<PageId>, StorageError> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .pages
            .iter()
            .filter(|p| &p.language == language)
            .map(|p| p.id)
            .max())
    }

    fn insert_meta(&self, meta: NewMeta) -> Result<MetaId, StorageError> {
        let mut tables = self.tables.write().unwrap();
        tables.next_meta += 1;
        let id = MetaId(tables.next_meta);
        tables.meta.push(MetaRecord {
            id,
            url: meta.url,
            title: meta.title,
            description: meta.description,
            keywords: meta.keywords,
        });
        Ok(id)
    }

    fn find_meta(&self, id: MetaId) -> Result<Option<MetaRecord>, StorageError> {
        let tables = self.tables.read().unwrap();
        Ok(tables.meta.iter().find(|m| m.id == id).cloned())
    }

    fn delete_meta(&self, ids: &[MetaId]) -> Result<usize, StorageError> {
        let mut tables = self.tables.write().unwrap();
        let before = tables.meta.len();
        tables.meta.retain(|m| !ids.contains(&m.id));
        Ok(before - tables.meta.len())
    }

    fn insert_blocks(&self, blocks: &[BlockRecord]) -> Result<(), StorageError> {
        let mut tables = self.tables.write().unwrap();
        tables.blocks.extend_from_slice(blocks);
        Ok(())
    }

    fn archive_blocks(&self, ids: &[BlockId]) -> Result<usize, StorageError> {
        let mut tables = self.tables.write().unwrap();
        let mut changed = 0;
        for block in tables
            .blocks
            .iter_mut()
            .filter(|b| ids.contains(&b.id) && b.status == BlockStatus::Active)
        {
            block.status = BlockStatus::Archive;
            changed += 1;
        }
        Ok(changed)
    }

    fn blocks_for_revision(
        &self,
        revision_id: RevisionId,
    ) -> Result<Vec<BlockRecord>, StorageError> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .blocks
            .iter()
            .filter(|b| b.revision_id == revision_id)
            .cloned()
            .collect())
    }

    fn delete_blocks_for_revisions(
        &self,
        revisions: &[RevisionId],
    ) -> Result<usize, StorageError> {
        let mut tables = self.tables.write().unwrap();
        let before = tables.blocks.len();
        tables
            .blocks
            .retain(|b| !revisions.contains(&b.revision_id));
        Ok(before - tables.blocks.len())
    }

    fn max_block_id(&self) -> Result<Option<BlockId>, StorageError> {
        let tables = self.tables.read().unwrap();
        Ok(tables.blocks.iter().map(|b| b.id).max())
    }

    fn insert_template(&self, template: NewTemplate) -> Result<TemplateId, StorageError> {
        let mut tables = self.tables.write().unwrap();
        tables.next_template += 1;
        let id = TemplateId(tables.next_template);
        tables.templates.push(TemplateRecord::from_new(id, template));
        Ok(id)
    }

    fn update_template(
        &self,
        id: TemplateId,
        template: NewTemplate,
    ) -> Result<bool, StorageError> {
        let mut tables = self.tables.write().unwrap();
        let Some(existing) = tables.templates.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        *existing = TemplateRecord::from_new(id, template);
        Ok(true)
    }

    fn clear_default_template(&self) -> Result<(), StorageError> {
        let mut tables = self.tables.write().unwrap();
        for template in &mut tables.templates {
            template.is_default = false;
        }
        Ok(())
    }

    fn find_template(&self, id: TemplateId) -> Result<Option<TemplateRecord>, StorageError> {
        let tables = self.tables.read().unwrap();
        Ok(tables.templates.iter().find(|t| t.id == id).cloned())
    }

    fn active_templates(&self) -> Result<Vec<TemplateRecord>, StorageError> {
        let tables = self.tables.read().unwrap();
        let mut templates: Vec<TemplateRecord> = tables
            .templates
            .iter()
            .filter(|t| t.active)
            .cloned()
            .collect();
        templates.sort_by_key(|t| t.id);
        Ok(templates)
    }
}
