//! Error type for page tree operations.

use arbor_cache::CacheError;
use arbor_storage::StorageError;

/// Failure writing to or reading from a gateway.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The page store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The artifact cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Error returned by page tree operations.
///
/// Validation, not-found and permission failures are raised before anything
/// is written. A persistence failure may happen after the store has changed;
/// the operation is then reported as failed so a stale navigation cache is
/// never mistaken for a successful mutation.
#[derive(Debug, thiserror::Error)]
pub enum PagesError {
    /// Malformed request (unknown drop kind, bad template format, empty block set).
    #[error("invalid request: {0}")]
    Validation(String),
    /// A page, target or template doesn't exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The page's flags forbid the operation.
    #[error("not allowed: {0}")]
    Permission(String),
    /// A store or cache write or read failed.
    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistenceError),
    /// No URL could be produced for a page.
    #[error("unresolved URL: {0}")]
    UnresolvedUrl(String),
}

impl From<StorageError> for PagesError {
    fn from(err: StorageError) -> Self {
        Self::Persistence(err.into())
    }
}

impl From<CacheError> for PagesError {
    fn from(err: CacheError) -> Self {
        Self::Persistence(err.into())
    }
}

#[cfg(test)]
mod tests {
    use arbor_storage::StorageErrorKind;

    use super::*;

    #[test]
    fn test_storage_error_is_persistence() {
        let err: PagesError = StorageError::new(StorageErrorKind::Unavailable).into();

        assert!(matches!(
            err,
            PagesError::Persistence(PersistenceError::Storage(_))
        ));
    }

    #[test]
    fn test_cache_error_is_persistence() {
        let err: PagesError = CacheError::InvalidKey("../x".to_owned()).into();

        assert!(matches!(err, PagesError::Persistence(PersistenceError::Cache(_))));
        assert!(err.to_string().contains("../x"));
    }
}
