//! Page tree, revisions and navigation cache for Arbor.
//!
//! This crate provides:
//! - [`PageManager`]: revision lifecycle, moves, deletion, blocks and templates
//! - [`NavigationBuilder`]: compiles the active tree into the URL map and
//!   navigation index and writes both to the cache
//! - [`NavigationCache`]: typed reader for those artifacts (URLs, menus, tree view)
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use arbor_cache::FileCache;
//! use arbor_pages::{CACHE_FORMAT_VERSION, PageManager, PagesConfig, RouteTable};
//! use arbor_storage::{FileSystem, FsGateway, Language, MemoryStore, PageId};
//!
//! let fs: Arc<dyn FileSystem> = Arc::new(FsGateway::new());
//! let store = Arc::new(MemoryStore::load(fs.as_ref(), &PathBuf::from(".arbor/pages.json"))?);
//! let cache = Arc::new(FileCache::new(
//!     Arc::clone(&fs),
//!     PathBuf::from(".arbor/cache"),
//!     CACHE_FORMAT_VERSION,
//! ));
//! let pages = PageManager::new(store, cache, fs, RouteTable::default(), PagesConfig::default());
//!
//! let en = Language::new("en")?;
//! println!("{}", pages.full_url(PageId::SITEMAP, &en)?);
//! # Ok(())
//! # }
//! ```

mod compiler;
mod error;
mod manager;
mod navigation;
mod page;
mod reorder;
mod template;
#[cfg(test)]
mod testing;
mod tree_loader;
mod url_resolver;

pub use compiler::{
    CompiledNavigation, NavigationBuilder, NavigationEntry, NavigationIndex, UrlMap, compile,
};
pub use error::{PagesError, PersistenceError};
pub use manager::{PageManager, PagesConfig};
pub use navigation::{MenuItem, NavigationCache, TreeView};
pub use page::TreeType;
pub use reorder::DropKind;
pub use template::{GridCell, TemplateGrid};
pub use tree_loader::{Forest, load_forest};
pub use url_resolver::{RouteTable, add_number};

/// Bump when the layout of the navigation artifacts changes.
pub const CACHE_FORMAT_VERSION: &str = "1";
