//! File-based cache implementation.
//!
//! [`FileCache`] stores cache entries as files, organized into buckets
//! (subdirectories). Each entry is a single file with a binary header
//! followed by the data:
//!
//! ```text
//! [etag_len: u32 LE][etag bytes][data bytes]
//! ```
//!
//! On construction, [`FileCache`] validates a `VERSION` file in the cache root.
//! If the version mismatches or is missing, the entire cache directory is wiped
//! and recreated, so artifacts written by an older format are never read.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use arbor_storage::FileSystem;

use crate::{Cache, CacheBucket, CacheError};

/// File-based [`Cache`] rooted at a directory.
///
/// Directory layout:
/// ```text
/// {root}/
/// +-- VERSION            # contains the cache version string
/// +-- navigation/        # bucket "navigation"
///     +-- keys_en        # cache entry
///     +-- navigation_en
/// ```
pub struct FileCache {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
}

impl FileCache {
    /// Create a new file-based cache at `root`, validating the cache version.
    ///
    /// If the `VERSION` file inside `root` does not match `version`, the entire
    /// cache directory is removed and recreated with the new version. Errors
    /// during validation are logged; the first failing write surfaces them.
    #[must_use]
    pub fn new(fs: Arc<dyn FileSystem>, root: PathBuf, version: &str) -> Self {
        validate_version(fs.as_ref(), &root, version);
        Self { fs, root }
    }

    /// Cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Cache for FileCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        Box::new(FileCacheBucket {
            fs: Arc::clone(&self.fs),
            dir: self.root.join(name),
        })
    }
}

/// A single bucket backed by a directory.
struct FileCacheBucket {
    fs: Arc<dyn FileSystem>,
    dir: PathBuf,
}

impl FileCacheBucket {
    fn entry_path(&self, key: &str) -> Result<PathBuf, CacheError> {
        let relative = Path::new(key);
        let plain = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(CacheError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(relative))
    }

    /// Read an entry and split it into etag and data.
    fn read_entry(&self, key: &str) -> Result<Option<(String, Vec<u8>)>, CacheError> {
        let path = self.entry_path(key)?;
        if !self.fs.exists(&path) {
            return Ok(None);
        }
        let mut bytes = self.fs.read_all(&path)?;

        let corrupt = |reason: &str| CacheError::Corrupt {
            key: key.to_owned(),
            reason: reason.to_owned(),
        };

        let len_buf: [u8; 4] = bytes
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| corrupt("truncated header"))?;
        let etag_len = u32::from_le_bytes(len_buf) as usize;
        let etag_end = 4 + etag_len;
        let etag_bytes = bytes
            .get(4..etag_end)
            .ok_or_else(|| corrupt("truncated etag"))?;
        let etag =
            String::from_utf8(etag_bytes.to_vec()).map_err(|_| corrupt("etag is not UTF-8"))?;

        let data = bytes.split_off(etag_end);
        Ok(Some((etag, data)))
    }
}

impl CacheBucket for FileCacheBucket {
    fn get(&self, key: &str, etag: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let Some((stored_etag, data)) = self.read_entry(key)? else {
            return Ok(None);
        };

        // Validate etag (skip if caller passes empty etag)
        if !etag.is_empty() && stored_etag != etag {
            return Ok(None);
        }
        Ok(Some(data))
    }

    fn etag(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.read_entry(key)?.map(|(etag, _)| etag))
    }

    fn set(&self, key: &str, etag: &str, value: &[u8]) -> Result<(), CacheError> {
        let path = self.entry_path(key)?;
        let etag_bytes = etag.as_bytes();
        let etag_len = u32::try_from(etag_bytes.len())
            .map_err(|_| CacheError::InvalidKey(format!("{key}: etag too long")))?;

        let mut buf = Vec::with_capacity(4 + etag_bytes.len() + value.len());
        buf.extend_from_slice(&etag_len.to_le_bytes());
        buf.extend_from_slice(etag_bytes);
        buf.extend_from_slice(value);

        self.fs.write_all(&path, &buf)?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        if !self.fs.exists(&self.dir) {
            return Ok(Vec::new());
        }
        let names = self.fs.list_files(&self.dir, None)?;
        // Dot files are in-flight temp files
        Ok(names.into_iter().filter(|n| !n.starts_with('.')).collect())
    }

    fn remove(&self, key: &str) -> Result<bool, CacheError> {
        let path = self.entry_path(key)?;
        Ok(self.fs.delete(&path)?)
    }
}

/// Validate the cache version, wiping the directory on mismatch.
fn validate_version(fs: &dyn FileSystem, root: &Path, version: &str) {
    let version_file = root.join("VERSION");

    match fs.read_all(&version_file) {
        Ok(stored) if stored == version.as_bytes() => {
            tracing::debug!("cache version matches: {version}");
            return;
        }
        Ok(stored) => {
            tracing::info!(
                stored = %String::from_utf8_lossy(&stored),
                current = version,
                "cache version mismatch, wiping cache"
            );
        }
        Err(_) => {
            tracing::info!("no cache VERSION file found, initializing cache");
        }
    }

    if let Err(e) = fs.remove_dir_all(root) {
        tracing::warn!("failed to remove cache directory: {e}");
    }
    if let Err(e) = fs.write_all(&version_file, version.as_bytes()) {
        tracing::warn!("failed to write cache VERSION file: {e}");
    }
}
