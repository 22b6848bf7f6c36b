//! Storage gateways for the Arbor page tree.
//!
//! This crate provides the two external collaborators the page core talks to:
//!
//! - [`PageStore`]: typed queries against the page, meta, block and template tables
//! - [`FileSystem`]: byte-level file access for cache artifacts and collision probes
//!
//! # Implementations
//!
//! - [`MemoryStore`]: in-memory tables with JSON snapshot persistence
//! - [`FsGateway`]: local filesystem with atomic temp-then-rename writes
//! - [`MockFileSystem`]: in-memory filesystem for tests (behind `mock` feature flag)
//!
//! # Example
//!
//! ```
//! use arbor_storage::{Language, MemoryStore, PageId, PageStore};
//!
//! let store = MemoryStore::new();
//! let language = Language::new("en").unwrap();
//! let children = store.active_children(&[PageId::ROOT], &language).unwrap();
//! assert!(children.is_empty());
//! ```

mod error;
mod fs;
mod memory;
#[cfg(feature = "mock")]
mod mock;
mod records;
mod store;

pub use error::{StorageError, StorageErrorKind};
pub use fs::{FileSystem, FsGateway};
pub use memory::MemoryStore;
#[cfg(feature = "mock")]
pub use mock::MockFileSystem;
pub use records::{
    BlockId, BlockRecord, BlockStatus, Language, MetaId, MetaRecord, NewMeta, NewPage,
    NewTemplate, PageId, PageRecord, PageStatus, PageSummary, RevisionId, RevisionSummary,
    TemplateId, TemplateRecord, UserId, Zone,
};
pub use store::{PageStore, Position};
