//! Sitehost Core Business Logic
//!
//! This crate provides the request resolution core for Sitehost: project
//! lookup by hostname, health-based domain redirects, device classification
//! and the content fallback chains, composed by [`SiteService`].

pub mod config;
pub mod database;
pub mod device;
pub mod error;
pub mod health;
pub mod resolver;
pub mod route;
pub mod service;
pub mod tags;

pub use config::SiteConfig;
pub use database::{
    Database, DatabaseProvider, DomainEntry, DomainInfo, HealthFlag, InMemoryDatabase,
    JsonFileDatabase, Project, ProjectGroup,
};
pub use device::{classify, is_mobile, is_tablet, Device, DeviceClass, DeviceVariant};
pub use error::CoreError;
pub use health::redirect_target;
pub use resolver::{Candidate, ContentResolver, Resolution, ResolvedFile};
pub use route::RouteShape;
pub use service::{NotFoundKind, Outcome, SiteRequest, SiteService};
pub use tags::{AllowedTags, Tags};
