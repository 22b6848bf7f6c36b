//! Artifact cache for Arbor.
//!
//! Derived data (the navigation cache) is persisted through generic caching
//! traits that decouple producers and readers from the underlying storage.
//! Two traits form the core API:
//!
//! - [`Cache`]: Factory for named cache buckets
//! - [`CacheBucket`]: Key-value store with an etag header per entry
//!
//! Unlike a best-effort cache, writes here are fallible: the artifacts are
//! the only structure consulted for URL and menu resolution, so a failed
//! write must reach the caller.
//!
//! # Implementations
//!
//! - [`FileCache`]: Versioned file-based implementation over a
//!   [`FileSystem`](arbor_storage::FileSystem) gateway
//!
//! # Example
//!
//! ```
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use arbor_cache::{Cache, FileCache};
//! use arbor_storage::FsGateway;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let cache = FileCache::new(Arc::new(FsGateway::new()), dir.path().join("cache"), "v1");
//! let bucket = cache.bucket("navigation");
//! bucket.set("keys_en", "generated=0", b"{}").unwrap();
//! assert_eq!(bucket.get("keys_en", "").unwrap(), Some(b"{}".to_vec()));
//! ```

mod ext;
mod file;

pub use ext::CacheBucketExt;
pub use file::FileCache;

use arbor_storage::StorageError;

/// Error returned by cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The underlying filesystem failed.
    #[error("cache storage error: {0}")]
    Storage(#[from] StorageError),
    /// An entry exists but its header or payload can't be decoded.
    #[error("corrupt cache entry {key}: {reason}")]
    Corrupt {
        /// Entry key.
        key: String,
        /// What was wrong with it.
        reason: String,
    },
    /// A key would escape its bucket directory.
    #[error("invalid cache key: {0}")]
    InvalidKey(String),
    /// Value (de)serialization failed.
    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A named partition within a [`Cache`].
///
/// Each entry carries an etag chosen by the writer (a version string or a
/// generation timestamp). A read with a non-empty etag only hits when the
/// stored etag matches.
pub trait CacheBucket: Send + Sync {
    /// Retrieve a cached value.
    ///
    /// Returns `Ok(None)` on miss or etag mismatch. If `etag` is empty,
    /// validation is skipped and the stored data is returned regardless of
    /// its etag.
    ///
    /// # Arguments
    ///
    /// * `key` - Entry key (e.g., `keys_en`)
    /// * `etag` - Expected etag (empty string skips validation)
    fn get(&self, key: &str, etag: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Read only the stored etag of an entry.
    fn etag(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value, replacing any existing entry for the key.
    ///
    /// # Arguments
    ///
    /// * `key` - Entry key
    /// * `etag` - Etag to associate with this entry
    /// * `value` - Raw bytes to cache
    fn set(&self, key: &str, etag: &str, value: &[u8]) -> Result<(), CacheError>;

    /// Keys of every entry in the bucket, sorted.
    fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// Drop an entry. Returns whether it existed.
    fn remove(&self, key: &str) -> Result<bool, CacheError>;
}

/// Factory for named cache [`CacheBucket`]s.
///
/// Buckets produced by one `Cache` are logically isolated from each other.
pub trait Cache: Send + Sync {
    /// Open or create a named bucket.
    ///
    /// # Arguments
    ///
    /// * `name` - Bucket name (e.g., "navigation")
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket>;
}
