//! In-memory storage backend

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::backend::{normalize_key, ContentStore};
use crate::error::StorageError;

/// In-memory content store
///
/// Useful for tests and for serving a fixed set of files. Keys are normalized
/// the same way as [`LocalStorage`](crate::LocalStorage), so `a//b` and `a/b`
/// address the same entry.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    files: HashMap<PathBuf, Bytes>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing any previous content
    pub fn insert(&mut self, key: &str, data: impl Into<Bytes>) -> Result<(), StorageError> {
        self.files.insert(normalize_key(key)?, data.into());
        Ok(())
    }

    /// Builder-style variant of [`insert`](Self::insert)
    pub fn with_file(mut self, key: &str, data: impl Into<Bytes>) -> Self {
        if let Ok(path) = normalize_key(key) {
            self.files.insert(path, data.into());
        }
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryStorage {
    async fn open(&self, key: &str) -> Result<Option<Bytes>, StorageError> {
        match normalize_key(key) {
            Ok(path) => Ok(self.files.get(&path).cloned()),
            Err(_) => Ok(None),
        }
    }

    fn storage_path(&self, key: &str) -> String {
        format!("memory://{}", key.trim_start_matches('/'))
    }
}
