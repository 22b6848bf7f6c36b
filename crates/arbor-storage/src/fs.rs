//! Filesystem gateway.
//!
//! Provides the [`FileSystem`] trait used to persist cache artifacts and
//! snapshots and to probe for path collisions, plus [`FsGateway`] for the
//! local filesystem.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;

use crate::error::StorageError;

/// Backend identifier for error messages.
const BACKEND: &str = "fs";

/// Byte-level file access.
pub trait FileSystem: Send + Sync {
    /// Check whether a file or directory exists at `path`.
    ///
    /// Returns `false` on errors (treats errors as "doesn't exist").
    fn exists(&self, path: &Path) -> bool;

    /// Read a whole file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file doesn't exist or can't be read.
    fn read_all(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    /// Replace a file's content, creating parent directories as needed.
    ///
    /// Readers observe either the previous content or the new content,
    /// never a partial write.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file can't be written.
    fn write_all(&self, path: &Path, data: &[u8]) -> Result<(), StorageError>;

    /// Names of the regular files directly inside `dir`, sorted.
    ///
    /// When `pattern` is given only names matching it are returned.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the directory can't be listed.
    fn list_files(&self, dir: &Path, pattern: Option<&Regex>) -> Result<Vec<String>, StorageError>;

    /// Delete a file. Returns `false` if there was nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file exists but can't be removed.
    fn delete(&self, path: &Path) -> Result<bool, StorageError>;

    /// Remove a directory and everything below it. Missing directories are
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the directory can't be removed.
    fn remove_dir_all(&self, path: &Path) -> Result<(), StorageError>;
}

/// Local filesystem gateway.
///
/// Writes go to a sibling temp file which is then renamed over the target.
#[derive(Debug, Default)]
pub struct FsGateway {
    temp_counter: AtomicU64,
}

impl FsGateway {
    /// Create a new local filesystem gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn temp_path(&self, path: &Path) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(".{name}.{}.{n}.tmp", process::id()))
    }
}

fn io_error(err: std::io::Error, path: &Path) -> StorageError {
    StorageError::io(err, Some(path.to_path_buf())).with_backend(BACKEND)
}

impl FileSystem for FsGateway {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        fs::read(path).map_err(|e| io_error(e, path))
    }

    fn write_all(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| io_error(e, parent))?;
        }

        let temp = self.temp_path(path);
        if let Err(e) = fs::write(&temp, data) {
            let _ = fs::remove_file(&temp);
            return Err(io_error(e, &temp));
        }
        if let Err(e) = fs::rename(&temp, path) {
            let _ = fs::remove_file(&temp);
            return Err(io_error(e, path));
        }
        Ok(())
    }

    fn list_files(&self, dir: &Path, pattern: Option<&Regex>) -> Result<Vec<String>, StorageError> {
        let entries = fs::read_dir(dir).map_err(|e| io_error(e, dir))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_error(e, dir))?;
            let is_file = entry.file_type().is_ok_and(|t| t.is_file());
            if !is_file {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if pattern.is_none_or(|p| p.is_match(&name)) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete(&self, path: &Path) -> Result<bool, StorageError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(e, path)),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), StorageError> {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(e, path)),
        }
    }
}
