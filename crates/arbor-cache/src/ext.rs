//! Extension trait for [`CacheBucket`] with typed convenience methods.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{CacheBucket, CacheError};

/// Typed convenience methods for [`CacheBucket`].
///
/// Provides `get_json`/`set_json` for serde-serializable types. These are
/// default methods on an extension trait so that [`CacheBucket`] stays
/// object-safe and implementors only handle raw bytes.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use arbor_cache::{Cache, CacheBucketExt, FileCache};
/// use arbor_storage::FsGateway;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize, PartialEq, Debug)]
/// struct Keys { home: String }
///
/// let dir = tempfile::tempdir().unwrap();
/// let cache = FileCache::new(Arc::new(FsGateway::new()), dir.path().to_path_buf(), "v1");
/// let bucket = cache.bucket("navigation");
///
/// bucket.set_json("keys_en", "", &Keys { home: String::new() }).unwrap();
/// let keys: Option<Keys> = bucket.get_json("keys_en", "").unwrap();
/// assert_eq!(keys, Some(Keys { home: String::new() }));
/// ```
pub trait CacheBucketExt: CacheBucket {
    /// Retrieve a JSON-deserialized value from the cache.
    ///
    /// Returns `Ok(None)` on miss or etag mismatch. A payload that doesn't
    /// decode is reported as [`CacheError::Corrupt`].
    fn get_json<T: DeserializeOwned>(
        &self,
        key: &str,
        etag: &str,
    ) -> Result<Option<T>, CacheError> {
        let Some(bytes) = self.get(key, etag)? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| CacheError::Corrupt {
                key: key.to_owned(),
                reason: e.to_string(),
            })
    }

    /// Store a value as JSON in the cache.
    fn set_json<T: Serialize>(&self, key: &str, etag: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, etag, &bytes)
    }
}

impl<B: CacheBucket + ?Sized> CacheBucketExt for B {}
