//! Content store trait

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;

use crate::error::StorageError;

/// Content store trait
///
/// Keys are `/`-separated paths relative to the store root, e.g.
/// `sites/<project id>/<project name>/index.html`. Opening a key is a single
/// attempt: a missing key, or one that names a directory, is `Ok(None)` rather
/// than an error, so callers never race an existence check against the read.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Read a regular file fully into memory, or `None` if there is none
    async fn open(&self, key: &str) -> Result<Option<Bytes>, StorageError>;

    /// Get the backing location for a key (for logging)
    fn storage_path(&self, key: &str) -> String;
}

/// Normalize a store key into a relative path.
///
/// Empty and `.` segments are dropped. Any `..` segment is rejected, so a key
/// can never address anything outside the store root.
pub fn normalize_key(key: &str) -> Result<PathBuf, StorageError> {
    let mut path = PathBuf::new();

    for segment in key.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => return Err(StorageError::InvalidPath(key.to_string())),
            s if s.contains(':') => return Err(StorageError::InvalidPath(key.to_string())),
            s => path.push(s),
        }
    }

    if path.as_os_str().is_empty() {
        return Err(StorageError::InvalidPath(key.to_string()));
    }

    Ok(path)
}
