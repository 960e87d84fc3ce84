//! Resolution settings shared by the core components
//!
//! Built once at startup by the binary and handed to constructors; nothing in
//! this crate reads the environment.

use std::path::PathBuf;

use crate::tags::AllowedTags;

/// Default location of the shared multilang override pages, relative to the
/// resources root.
pub const DEFAULT_OVERRIDE_DIR: &str = "safeguard/html_files";

/// Settings for the site resolution pipeline
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Path to the project database JSON document
    pub database_path: PathBuf,
    /// Root of the resources tree (`sites/`, `images/`, ...)
    pub resources_root: PathBuf,
    /// Tags that unlock the short-id routes
    pub allowed_tags: AllowedTags,
    /// Multilang override directory, relative to the resources root
    pub override_dir: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("./database.json"),
            resources_root: PathBuf::from("./resources/"),
            allowed_tags: AllowedTags::default(),
            override_dir: DEFAULT_OVERRIDE_DIR.to_string(),
        }
    }
}
