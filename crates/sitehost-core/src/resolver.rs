//! Content fallback chains
//!
//! Every route shape maps to an ordered list of [`Candidate`]s. Candidates are
//! opened strictly in order through the injected [`ContentStore`]; the first
//! regular file wins.

use bytes::Bytes;
use percent_encoding::percent_decode_str;
use sitehost_storage::ContentStore;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::config::SiteConfig;
use crate::database::DomainInfo;
use crate::device::DeviceVariant;
use crate::error::CoreError;
use crate::route::{resource_path, RouteShape};
use crate::tags::AllowedTags;

const TEXT_HTML: &str = "text/html";
const INDEX: &str = "index.html";

/// A store key to try, with the content type to serve it as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub key: String,
    pub content_type: String,
}

impl Candidate {
    fn html(key: String) -> Self {
        Self {
            key,
            content_type: TEXT_HTML.to_string(),
        }
    }

    fn guessed(key: String) -> Self {
        let content_type = mime_guess::from_path(&key)
            .first_or_octet_stream()
            .to_string();
        Self { key, content_type }
    }
}

/// A file that resolved
#[derive(Debug, Clone)]
pub struct ResolvedFile {
    pub key: String,
    pub content_type: String,
    pub body: Bytes,
}

/// Outcome of resolving one route shape
#[derive(Debug)]
pub enum Resolution {
    Found(ResolvedFile),
    /// Every candidate was missing
    Missing,
    /// The shape is tag-gated and the project is not allowed to use it
    NotOwned,
}

/// Builds and evaluates candidate chains
pub struct ContentResolver {
    store: Arc<dyn ContentStore>,
    allowed_tags: AllowedTags,
    override_dir: String,
}

impl ContentResolver {
    pub fn new(store: Arc<dyn ContentStore>, config: &SiteConfig) -> Self {
        Self {
            store,
            allowed_tags: config.allowed_tags.clone(),
            override_dir: config.override_dir.trim_matches('/').to_string(),
        }
    }

    /// Candidate chain for a route shape.
    ///
    /// Returns `None` when the shape is tag-gated and the project's tags do
    /// not intersect the allow-list. [`RouteShape::Other`] has no chain of its
    /// own; see [`static_candidates`](Self::static_candidates).
    pub fn candidates(
        &self,
        info: &DomainInfo<'_>,
        variant: DeviceVariant,
        shape: &RouteShape<'_>,
    ) -> Option<Vec<Candidate>> {
        let site = info.site_root();
        let tags = &info.project.tags;

        if shape.is_dynamic() && !self.allowed_tags.permits(tags) {
            return None;
        }

        let mut chain = Vec::new();
        match shape {
            RouteShape::ShortId { .. } => {
                let page = variant.page();
                if tags.is_multilang() {
                    chain.push(Candidate::html(format!("{}/{}", self.override_dir, page)));
                }
                chain.push(Candidate::html(format!("{}/{}/{}", site, variant, page)));
                chain.push(Candidate::html(format!("{}/{}", site, page)));
                chain.push(Candidate::html(format!("{}/{}", site, INDEX)));
            }
            RouteShape::IdFile { name, .. } => {
                let original = format!("{}.html", name);
                let device_specific = format!("{}_{}", variant, original);
                if tags.is_multilang() {
                    chain.push(Candidate::html(format!("{}/{}", self.override_dir, device_specific)));
                    chain.push(Candidate::html(format!("{}/{}", self.override_dir, original)));
                }
                chain.push(Candidate::html(format!("{}/{}", site, device_specific)));
                chain.push(Candidate::html(format!("{}/{}", site, original)));
            }
            RouteShape::Device { variant, rest } => {
                chain.push(Candidate::html(format!("{}/{}/{}.html", site, variant, rest)));
                chain.push(Candidate::html(format!("{}/{}", site, variant.page())));
                chain.push(Candidate::html(format!("{}/{}", site, INDEX)));
            }
            RouteShape::Root => {
                chain.push(Candidate::html(format!("{}/{}", site, INDEX)));
            }
            RouteShape::Other => {}
        }

        Some(chain)
    }

    /// Candidate chain for the generic static lookup of a request path.
    ///
    /// Shared resource paths try the resources root first. Then the path
    /// inside the site tree, then its `index.html` when the path looks like a
    /// directory (`/`, trailing slash, or no extension).
    pub fn static_candidates(&self, info: &DomainInfo<'_>, path: &str) -> Vec<Candidate> {
        let Ok(decoded) = percent_decode_str(path).decode_utf8() else {
            return Vec::new();
        };
        let site = info.site_root();
        let mut chain = Vec::new();

        if let Some((dir, rest)) = resource_path(&decoded) {
            chain.push(Candidate::guessed(format!("{}/{}", dir, rest)));
        }

        let relative = decoded.trim_start_matches('/');
        if !relative.is_empty() {
            chain.push(Candidate::guessed(format!("{}/{}", site, relative)));
        }

        let looks_like_dir = decoded == "/"
            || decoded.ends_with('/')
            || Path::new(relative).extension().is_none();
        if looks_like_dir {
            let dir = relative.trim_end_matches('/');
            let key = if dir.is_empty() {
                format!("{}/{}", site, INDEX)
            } else {
                format!("{}/{}/{}", site, dir, INDEX)
            };
            chain.push(Candidate::guessed(key));
        }

        chain
    }

    /// Resolve a route shape for a project
    pub async fn resolve(
        &self,
        info: &DomainInfo<'_>,
        variant: DeviceVariant,
        shape: &RouteShape<'_>,
    ) -> Result<Resolution, CoreError> {
        let Some(chain) = self.candidates(info, variant, shape) else {
            debug!(
                "Project {}/{} has no allowed tag for {:?}",
                info.project_id, info.project_name, shape
            );
            return Ok(Resolution::NotOwned);
        };

        Ok(match self.first_existing(&chain).await? {
            Some(file) => Resolution::Found(file),
            None => Resolution::Missing,
        })
    }

    /// Generic static lookup for a request path
    pub async fn resolve_static(
        &self,
        info: &DomainInfo<'_>,
        path: &str,
    ) -> Result<Option<ResolvedFile>, CoreError> {
        self.first_existing(&self.static_candidates(info, path)).await
    }

    /// Open candidates in order and return the first regular file
    pub async fn first_existing(
        &self,
        candidates: &[Candidate],
    ) -> Result<Option<ResolvedFile>, CoreError> {
        for candidate in candidates {
            if let Some(body) = self.store.open(&candidate.key).await? {
                debug!("Resolved {}", self.store.storage_path(&candidate.key));
                return Ok(Some(ResolvedFile {
                    key: candidate.key.clone(),
                    content_type: candidate.content_type.clone(),
                    body,
                }));
            }
        }
        Ok(None)
    }
}
