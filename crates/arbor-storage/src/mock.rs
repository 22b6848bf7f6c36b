//! Mock filesystem for testing.
//!
//! Provides [`MockFileSystem`] for unit testing without touching disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use regex::Regex;

use crate::error::{StorageError, StorageErrorKind};
use crate::fs::FileSystem;

/// Backend identifier for error messages.
const BACKEND: &str = "mock fs";

/// In-memory filesystem.
///
/// Directories exist implicitly when a file below them exists, or when
/// registered with [`MockFileSystem::with_dir`].
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use arbor_storage::{FileSystem, MockFileSystem};
///
/// let fs = MockFileSystem::new().with_file("www/about/index.html", "<html>");
/// assert!(fs.exists(Path::new("www/about")));
/// ```
#[derive(Debug, Default)]
pub struct MockFileSystem {
    files: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
    dirs: RwLock<Vec<PathBuf>>,
    fail_writes: AtomicBool,
}

impl MockFileSystem {
    /// Create a new empty mock filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.files
            .write()
            .unwrap()
            .insert(path.into(), content.into());
        self
    }

    /// Add an empty directory.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
        self.dirs.write().unwrap().push(path.into());
        self
    }

    /// Make every subsequent write fail with a permission error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Paths of every stored file.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.read().unwrap().keys().cloned().collect()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let files = self.files.read().unwrap();
        files.keys().any(|p| p.starts_with(path))
            || self
                .dirs
                .read()
                .unwrap()
                .iter()
                .any(|d| d.starts_with(path))
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        self.files
            .read()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::not_found(path).with_backend(BACKEND))
    }

    fn write_all(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::new(StorageErrorKind::PermissionDenied)
                .with_backend(BACKEND)
                .with_path(path));
        }
        self.files
            .write()
            .unwrap()
            .insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    fn list_files(&self, dir: &Path, pattern: Option<&Regex>) -> Result<Vec<String>, StorageError> {
        let files = self.files.read().unwrap();
        let mut names: Vec<String> = files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .filter(|name| pattern.is_none_or(|re| re.is_match(name)))
            .collect();
        names.sort();
        Ok(names)
    }

    fn delete(&self, path: &Path) -> Result<bool, StorageError> {
        Ok(self.files.write().unwrap().remove(path).is_some())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), StorageError> {
        self.files
            .write()
            .unwrap()
            .retain(|p, _| !p.starts_with(path));
        self.dirs.write().unwrap().retain(|d| !d.starts_with(path));
        Ok(())
    }
}
