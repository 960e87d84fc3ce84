//! Local disk storage backend

use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::backend::{normalize_key, ContentStore};
use crate::error::StorageError;

/// Local disk storage backend
///
/// Serves files from a resources directory laid out as:
/// `<base_path>/sites/<project id>/<project name>/...` for per-project trees,
/// `<base_path>/{images,scripts,styles}/...` for shared resources.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new local storage backend
    pub async fn new(base_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref().to_path_buf();

        match fs::metadata(&base_path).await {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => {
                return Err(StorageError::MissingRoot(
                    base_path.to_string_lossy().to_string(),
                ));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // Resources may be provisioned after startup; keep serving misses until then.
                warn!("Resources directory {:?} does not exist yet", base_path);
            }
            Err(e) => return Err(StorageError::Io(e)),
        }

        info!("Initialized local storage at {:?}", base_path);

        Ok(Self { base_path })
    }

    /// Get the base path of this store
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the file path for a key
    fn file_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        Ok(self.base_path.join(normalize_key(key)?))
    }
}

fn is_missing(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

#[async_trait]
impl ContentStore for LocalStorage {
    async fn open(&self, key: &str) -> Result<Option<Bytes>, StorageError> {
        let path = match self.file_path(key) {
            Ok(path) => path,
            Err(e) => {
                warn!("Rejected content key {}: {}", key, e);
                return Ok(None);
            }
        };

        let mut file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if is_missing(&e) => return Ok(None),
            Err(e) => return Err(StorageError::Io(e)),
        };

        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Ok(None);
        }

        debug!("Reading file from {:?}", path);

        let mut data = Vec::with_capacity(metadata.len() as usize);
        match file.read_to_end(&mut data).await {
            Ok(_) => Ok(Some(Bytes::from(data))),
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn storage_path(&self, key: &str) -> String {
        self.file_path(key)
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sites/p1/main")).unwrap();
        std::fs::write(dir.path().join("sites/p1/main/index.html"), "<h1>hi</h1>").unwrap();

        let storage = LocalStorage::new(dir.path()).await.unwrap();
        let data = storage.open("sites/p1/main/index.html").await.unwrap();

        assert_eq!(data.unwrap(), Bytes::from_static(b"<h1>hi</h1>"));
    }

    #[tokio::test]
    async fn test_open_missing_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sites/p1/main")).unwrap();
        std::fs::write(dir.path().join("sites/p1/main/index.html"), "x").unwrap();

        let storage = LocalStorage::new(dir.path()).await.unwrap();

        assert!(storage.open("sites/p1/main/missing.html").await.unwrap().is_none());
        assert!(storage.open("sites/p1/main").await.unwrap().is_none());
        // A file used as a directory component is a miss, not an error
        assert!(storage.open("sites/p1/main/index.html/extra").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("resources");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(dir.path().join("secret.txt"), "secret").unwrap();

        let storage = LocalStorage::new(&root).await.unwrap();

        assert!(storage.open("../secret.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_new_rejects_file_root() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = LocalStorage::new(file.path()).await;

        assert!(matches!(result, Err(StorageError::MissingRoot(_))));
    }
}
