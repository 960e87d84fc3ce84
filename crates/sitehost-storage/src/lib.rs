//! Sitehost Storage Layer
//!
//! This crate provides the content store abstraction used to resolve
//! site files, with a local disk backend and an in-memory backend.

pub mod backend;
pub mod error;
pub mod local;
pub mod memory;

pub use backend::{normalize_key, ContentStore};
pub use error::StorageError;
pub use local::LocalStorage;
pub use memory::MemoryStorage;
