//! Project database model and hostname lookup
//!
//! The database is a JSON document:
//!
//! ```text
//! { "ids": { <project id>: { "projects": { <project name>: {
//!     "domains": { <hostname>: { "healthy": true | "true" | ... } },
//!     "tags": "tag" | ["tag", ...],
//!     "redirect": bool,
//!     "currentDomain": "fallback.example.com"
//! } } } } }
//! ```
//!
//! Map order is preserved from the document; it defines both the
//! first-match order of [`Database::resolve`] and the health scan order.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use crate::error::CoreError;
use crate::tags::Tags;

/// Root of the project database
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Database {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ids: IndexMap<String, ProjectGroup>,
}

/// All projects under one project ID
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectGroup {
    #[serde(default, deserialize_with = "null_as_default")]
    pub projects: IndexMap<String, Project>,
}

/// A hosted site
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Project {
    /// Hostnames bound to this project; falsy entries are not bound
    #[serde(default, deserialize_with = "lenient_domains")]
    pub domains: IndexMap<String, Option<DomainEntry>>,
    #[serde(default)]
    pub tags: Tags,
    /// Whether health-based redirection is enabled
    #[serde(default, deserialize_with = "truthy")]
    pub redirect: bool,
    /// Last-resort redirect target; non-string values are ignored
    #[serde(default, rename = "currentDomain", deserialize_with = "string_or_none")]
    pub current_domain: Option<String>,
}

/// Per-hostname status
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainEntry {
    #[serde(default)]
    pub healthy: HealthFlag,
}

/// Normalized health flag.
///
/// Only boolean `true` and the string `"true"` count as healthy. Boolean
/// `false` and `"false"` are explicitly unhealthy; anything else (missing,
/// numbers, other strings) is unknown and treated as not healthy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HealthFlag {
    Healthy,
    Unhealthy,
    #[default]
    Unknown,
}

impl HealthFlag {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Bool(true) => HealthFlag::Healthy,
            Value::String(s) if s == "true" => HealthFlag::Healthy,
            Value::Bool(false) => HealthFlag::Unhealthy,
            Value::String(s) if s == "false" => HealthFlag::Unhealthy,
            _ => HealthFlag::Unknown,
        }
    }

    pub fn is_healthy(self) -> bool {
        self == HealthFlag::Healthy
    }
}

impl<'de> Deserialize<'de> for HealthFlag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(HealthFlag::from_value(&Value::deserialize(deserializer)?))
    }
}

impl DomainEntry {
    pub fn is_healthy(&self) -> bool {
        self.healthy.is_healthy()
    }

    /// Build an entry from any JSON value.
    ///
    /// Objects are read for their `healthy` flag. Any other truthy value binds
    /// the domain with an unknown health flag; falsy values leave it unbound.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(DomainEntry {
                healthy: fields
                    .get("healthy")
                    .map(HealthFlag::from_value)
                    .unwrap_or_default(),
            }),
            other if is_truthy(other) => Some(DomainEntry::default()),
            _ => None,
        }
    }
}

/// Loose truthiness for flags written by hand or by other tools
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(is_truthy(&Value::deserialize(deserializer)?))
}

/// A malformed entry only unbinds that hostname, never the whole document
fn lenient_domains<'de, D>(deserializer: D) -> Result<IndexMap<String, Option<DomainEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(entries) => entries
            .iter()
            .map(|(host, value)| (host.clone(), DomainEntry::from_value(value)))
            .collect(),
        _ => IndexMap::new(),
    })
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Result of resolving a hostname against the database
#[derive(Debug, Clone, Copy)]
pub struct DomainInfo<'a> {
    pub project_id: &'a str,
    pub project_name: &'a str,
    /// The hostname that matched
    pub host: &'a str,
    pub domain: &'a DomainEntry,
    pub project: &'a Project,
}

impl DomainInfo<'_> {
    /// Root of this project's site tree, relative to the resources root
    pub fn site_root(&self) -> String {
        format!("sites/{}/{}", self.project_id, self.project_name)
    }
}

impl Database {
    /// Parse a database document
    pub fn from_slice(data: &[u8]) -> Result<Self, CoreError> {
        serde_json::from_slice(data).map_err(|e| CoreError::DatabaseUnavailable(e.to_string()))
    }

    /// Load a database document from disk
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        debug!("Loading database from {:?}", path);

        let data = tokio::fs::read(path).await.map_err(|e| {
            error!("Error reading database {:?}: {}", path, e);
            CoreError::DatabaseUnavailable(format!("{}: {}", path.display(), e))
        })?;

        Self::from_slice(&data).inspect_err(|e| error!("Error parsing database {:?}: {}", path, e))
    }

    /// Find the project that owns a hostname.
    ///
    /// Exact, case-sensitive key match. Iterates project IDs, then project
    /// names, in stored order and returns the first match.
    pub fn resolve<'a>(&'a self, host: &'a str) -> Option<DomainInfo<'a>> {
        self.ids.iter().find_map(|(project_id, group)| {
            group.projects.iter().find_map(|(project_name, project)| {
                match project.domains.get(host) {
                    Some(Some(domain)) => Some(DomainInfo {
                        project_id: project_id.as_str(),
                        project_name: project_name.as_str(),
                        host,
                        domain,
                        project,
                    }),
                    _ => None,
                }
            })
        })
    }

    /// Total number of projects across all IDs
    pub fn project_count(&self) -> usize {
        self.ids.values().map(|g| g.projects.len()).sum()
    }
}

/// Source of database snapshots.
///
/// The pipeline asks for a fresh snapshot on every request; implementations
/// must not hand out state that a later request could observe mid-update.
#[async_trait]
pub trait DatabaseProvider: Send + Sync {
    async fn load(&self) -> Result<Database, CoreError>;
}

/// Re-reads a JSON file on every load
#[derive(Debug, Clone)]
pub struct JsonFileDatabase {
    path: PathBuf,
}

impl JsonFileDatabase {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DatabaseProvider for JsonFileDatabase {
    async fn load(&self) -> Result<Database, CoreError> {
        Database::load(&self.path).await
    }
}

/// Fixed in-memory database (for testing)
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    database: Database,
}

impl InMemoryDatabase {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl DatabaseProvider for InMemoryDatabase {
    async fn load(&self) -> Result<Database, CoreError> {
        Ok(self.database.clone())
    }
}
