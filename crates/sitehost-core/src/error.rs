//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database unavailable: {0}")]
    DatabaseUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sitehost_storage::StorageError),
}
