//! Storage error types.
//!
//! [`StorageError`] is shared by the page store and the filesystem gateway so
//! callers can handle every backend failure the same way.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// What went wrong, independent of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// File or row is missing.
    NotFound,
    PermissionDenied,
    /// Bad identifier, value or path supplied by the caller.
    InvalidInput,
    /// Stored data could not be decoded.
    Corrupt,
    /// Backend did not answer (timeout, interrupted call). Worth retrying.
    Unavailable,
    Other,
}

impl StorageErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::PermissionDenied => "permission denied",
            Self::InvalidInput => "invalid input",
            Self::Corrupt => "corrupt data",
            Self::Unavailable => "unavailable",
            Self::Other => "storage failure",
        }
    }
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage error with semantic kind and backend-specific source.
///
/// Rendered as `{kind}[: {message}][: {path}][: {source}] ({backend})`.
#[derive(Debug)]
pub struct StorageError {
    pub kind: StorageErrorKind,
    /// File the failure concerns, if any.
    pub path: Option<PathBuf>,
    /// Backend label (`"fs"`, `"memory store"`, ...).
    pub backend: Option<&'static str>,
    message: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            message: None,
            source: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Missing file at `path`.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_path(path)
    }

    /// Rejected caller input.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::InvalidInput).with_message(message)
    }

    /// Classify an I/O error.
    #[must_use]
    pub fn io(err: io::Error, path: Option<PathBuf>) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidFilename => {
                StorageErrorKind::InvalidInput
            }
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => StorageErrorKind::Corrupt,
            io::ErrorKind::TimedOut | io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock => {
                StorageErrorKind::Unavailable
            }
            _ => StorageErrorKind::Other,
        };
        let error = Self::new(kind).with_source(err);
        match path {
            Some(path) => error.with_path(path),
            None => error,
        }
    }

    #[must_use]
    pub fn kind(&self) -> StorageErrorKind {
        self.kind
    }

    /// Whether the same call may succeed if repeated.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind == StorageErrorKind::Unavailable
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(path) = &self.path {
            write!(f, ": {}", path.display())?;
        }
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        if let Some(backend) = self.backend {
            write!(f, " ({backend})")?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;
    use std::path::Path;

    use super::*;

    #[test]
    fn test_display_with_path_and_backend() {
        let err = StorageError::not_found("cache/navigation/keys_en").with_backend("fs");

        assert_eq!(err.to_string(), "not found: cache/navigation/keys_en (fs)");
        assert_eq!(err.path.as_deref(), Some(Path::new("cache/navigation/keys_en")));
    }

    #[test]
    fn test_display_with_message() {
        let err = StorageError::invalid_input("language code cannot be empty")
            .with_backend("memory store");

        assert_eq!(
            err.to_string(),
            "invalid input: language code cannot be empty (memory store)"
        );
    }

    #[test]
    fn test_io_error_classification() {
        let cases = [
            (io::ErrorKind::NotFound, StorageErrorKind::NotFound),
            (io::ErrorKind::PermissionDenied, StorageErrorKind::PermissionDenied),
            (io::ErrorKind::InvalidData, StorageErrorKind::Corrupt),
            (io::ErrorKind::TimedOut, StorageErrorKind::Unavailable),
            (io::ErrorKind::OutOfMemory, StorageErrorKind::Other),
        ];
        for (io_kind, expected) in cases {
            let err = StorageError::io(io::Error::from(io_kind), None);
            assert_eq!(err.kind(), expected, "{io_kind:?}");
            assert_eq!(err.is_transient(), expected == StorageErrorKind::Unavailable);
        }
    }

    #[test]
    fn test_source_is_exposed() {
        let err = StorageError::io(io::Error::other("disk full"), Some(PathBuf::from("a")));

        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "storage failure: a: disk full");
    }
}
