//! Request pipeline
//!
//! ```text
//! load database snapshot
//!     → resolve project by host
//!     → health redirect (301, short-circuit)
//!     → /detect/* device redirect (302)
//!     → dynamic short-id routes (tag gated)
//!     → generic static lookup
//!     → explicit device routes, default root
//!     → not found
//! ```

use sitehost_notify::{dispatch, escape_html, Notifier};
use std::sync::Arc;
use tracing::{debug, info};

use crate::database::{DatabaseProvider, DomainInfo};
use crate::device::{Device, DeviceVariant};
use crate::error::CoreError;
use crate::health::redirect_target;
use crate::resolver::{ContentResolver, Resolution, ResolvedFile};
use crate::route::{detect_redirect, is_skipped, RouteShape};

/// The parts of an HTTP request the pipeline looks at
#[derive(Debug, Clone, Copy)]
pub struct SiteRequest<'a> {
    /// `Host` header as received, port included
    pub host: Option<&'a str>,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub user_agent: &'a str,
}

impl SiteRequest<'_> {
    /// Path plus query string, as originally requested
    pub fn path_and_query(&self) -> String {
        match self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.to_string(),
        }
    }
}

/// Which 404 the caller should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    Mobile,
    Desktop,
    Generic,
}

impl NotFoundKind {
    fn for_path(path: &str) -> Self {
        match RouteShape::parse(path) {
            RouteShape::Device {
                variant: DeviceVariant::Mobile,
                ..
            } => NotFoundKind::Mobile,
            RouteShape::Device {
                variant: DeviceVariant::Desktop,
                ..
            } => NotFoundKind::Desktop,
            _ => NotFoundKind::Generic,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            NotFoundKind::Mobile => "Mobile version not found",
            NotFoundKind::Desktop => "Desktop version not found",
            NotFoundKind::Generic => "Not Found",
        }
    }
}

/// What the pipeline decided for a request
#[derive(Debug)]
pub enum Outcome {
    /// 301 to a healthy sibling domain
    HealthRedirect { location: String },
    /// 302 to a device-specific path
    DeviceRedirect { location: String },
    /// 200 with file content
    Content(ResolvedFile),
    /// Nothing matched; shared resource handlers may still serve the path
    NotFound(NotFoundKind),
}

/// Composes registry lookup, health policy, device detection and content
/// resolution for one request at a time.
pub struct SiteService {
    database: Arc<dyn DatabaseProvider>,
    resolver: ContentResolver,
    notifier: Arc<dyn Notifier>,
}

impl SiteService {
    pub fn new(
        database: Arc<dyn DatabaseProvider>,
        resolver: ContentResolver,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            database,
            resolver,
            notifier,
        }
    }

    /// Handle one request.
    ///
    /// Errors only when the database cannot be loaded or the store fails;
    /// unknown hosts, gated tags and missing files all end in
    /// [`Outcome::NotFound`].
    pub async fn handle(&self, request: &SiteRequest<'_>) -> Result<Outcome, CoreError> {
        let path = request.path;
        let variant = DeviceVariant::from_user_agent(request.user_agent);

        let host = match request.host {
            Some(host) if !is_skipped(path) => host,
            _ => return Ok(self.device_redirect(request, variant).unwrap_or_else(|| not_found(path))),
        };

        let database = self.database.load().await?;

        let Some(info) = database.resolve(host) else {
            debug!("Domain not found in database: {}", host);
            return Ok(self.device_redirect(request, variant).unwrap_or_else(|| not_found(path)));
        };

        if let Some(target) = redirect_target(&info)
            && target != host
        {
            return Ok(self.health_redirect(request, &info, target));
        }

        if let Some(outcome) = self.device_redirect(request, variant) {
            return Ok(outcome);
        }

        let device = Device::detect(request.user_agent);
        debug!(
            "Resolving {} for {}/{} as {} ({} pages)",
            path, info.project_id, info.project_name, device.class, device.variant
        );

        self.resolve_content(&info, device, path).await
    }

    /// Load the database once and report how many projects it holds
    pub async fn check_database(&self) -> Result<usize, CoreError> {
        Ok(self.database.load().await?.project_count())
    }

    async fn resolve_content(
        &self,
        info: &DomainInfo<'_>,
        device: Device,
        path: &str,
    ) -> Result<Outcome, CoreError> {
        let shape = RouteShape::parse(path);

        if shape.is_dynamic() {
            match self.resolver.resolve(info, device.variant, &shape).await? {
                Resolution::Found(file) => return Ok(Outcome::Content(file)),
                Resolution::Missing | Resolution::NotOwned => {}
            }
        }

        if let Some(file) = self.resolver.resolve_static(info, path).await? {
            return Ok(Outcome::Content(file));
        }

        if matches!(shape, RouteShape::Device { .. } | RouteShape::Root)
            && let Resolution::Found(file) =
                self.resolver.resolve(info, device.variant, &shape).await?
        {
            return Ok(Outcome::Content(file));
        }

        Ok(not_found(path))
    }

    fn health_redirect(&self, request: &SiteRequest<'_>, info: &DomainInfo<'_>, target: &str) -> Outcome {
        let host = info.host;
        info!("Redirecting from {} to {}", host, target);

        dispatch(
            self.notifier.clone(),
            format!(
                "🔄 Redirecting request:\n\
                 - From: <code>{}</code>\n\
                 - To: <code>{}</code>\n\
                 - Path: <code>{}</code>\n\
                 - Project: <code>{}/{}</code>",
                escape_html(host),
                escape_html(target),
                escape_html(request.path),
                escape_html(info.project_id),
                escape_html(info.project_name)
            ),
        );

        Outcome::HealthRedirect {
            location: format!("https://{}{}", target, request.path_and_query()),
        }
    }

    fn device_redirect(&self, request: &SiteRequest<'_>, variant: DeviceVariant) -> Option<Outcome> {
        let location = detect_redirect(request.path, request.query, variant)?;
        info!("Device detected as {}, redirecting to: {}", variant, location);
        Some(Outcome::DeviceRedirect { location })
    }
}

fn not_found(path: &str) -> Outcome {
    Outcome::NotFound(NotFoundKind::for_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::database::{Database, InMemoryDatabase};
    use crate::tags::AllowedTags;
    use async_trait::async_trait;
    use bytes::Bytes;
    use sitehost_notify::NotifyError;
    use sitehost_storage::MemoryStorage;
    use tokio::sync::mpsc;

    const ID: &str = "a1B2c3D4e5F6g7H8i9J0k1L2";
    const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148";
    const DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/120.0 Safari/537.36";

    const DATABASE: &str = r#"{ "ids": {
        "p1": { "projects": {
            "landing": {
                "domains": {
                    "down.com": { "healthy": false },
                    "up.com": { "healthy": true }
                },
                "tags": ["landing"],
                "redirect": true
            },
            "blog": {
                "domains": { "blog.com": { "healthy": true } },
                "tags": "blog"
            },
            "solo": {
                "domains": { "solo.com": { "healthy": false } },
                "redirect": true,
                "currentDomain": "solo.com"
            }
        } }
    } }"#;

    struct ChannelNotifier(mpsc::UnboundedSender<String>);

    #[async_trait]
    impl Notifier for ChannelNotifier {
        async fn notify(&self, message: &str) -> Result<(), NotifyError> {
            let _ = self.0.send(message.to_string());
            Ok(())
        }
    }

    struct BrokenDatabase;

    #[async_trait]
    impl DatabaseProvider for BrokenDatabase {
        async fn load(&self) -> Result<Database, CoreError> {
            Err(CoreError::DatabaseUnavailable("unreadable".to_string()))
        }
    }

    fn store() -> MemoryStorage {
        MemoryStorage::new()
            .with_file("sites/p1/landing/index.html", "landing-index")
            .with_file("sites/p1/landing/mobile.html", "landing-mobile")
            .with_file("sites/p1/landing/mobile/offer.html", "mobile-offer")
            .with_file("sites/p1/blog/index.html", "blog-index")
            .with_file("sites/p1/blog/about.html", "blog-about")
            .with_file(&format!("sites/p1/blog/{ID}/index.html"), "blog-dir")
            .with_file("sites/p1/solo/index.html", "solo-index")
    }

    fn service() -> (SiteService, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = SiteConfig {
            allowed_tags: AllowedTags::parse("landing"),
            ..SiteConfig::default()
        };
        let database = Database::from_slice(DATABASE.as_bytes()).unwrap();
        let service = SiteService::new(
            Arc::new(InMemoryDatabase::new(database)),
            ContentResolver::new(Arc::new(store()), &config),
            Arc::new(ChannelNotifier(tx)),
        );
        (service, rx)
    }

    fn request<'a>(host: &'a str, path: &'a str, user_agent: &'a str) -> SiteRequest<'a> {
        SiteRequest {
            host: Some(host),
            path,
            query: None,
            user_agent,
        }
    }

    fn body(outcome: Outcome) -> Bytes {
        match outcome {
            Outcome::Content(file) => file.body,
            other => panic!("expected content, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_health_redirect_preserves_path_and_query() {
        let (service, mut rx) = service();
        let req = SiteRequest {
            query: Some("ref=mail"),
            ..request("down.com", "/promo", DESKTOP)
        };

        match service.handle(&req).await.unwrap() {
            Outcome::HealthRedirect { location } => {
                assert_eq!(location, "https://up.com/promo?ref=mail");
            }
            other => panic!("expected redirect, got {:?}", other),
        }

        let message = rx.recv().await.unwrap();
        assert!(message.contains("<code>down.com</code>"));
        assert!(message.contains("<code>p1/landing</code>"));
    }

    #[tokio::test]
    async fn test_current_domain_equal_to_host_serves_content() {
        // Unhealthy with no healthy sibling; the fallback target is the host itself
        let (service, mut rx) = service();

        let outcome = service.handle(&request("solo.com", "/", DESKTOP)).await.unwrap();
        assert_eq!(body(outcome), Bytes::from_static(b"solo-index"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_redirect_notification_is_escaped() {
        let (service, mut rx) = service();

        let outcome = service
            .handle(&request("down.com", "/a<b>&c", DESKTOP))
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::HealthRedirect { .. }));

        let message = rx.recv().await.unwrap();
        assert!(message.contains("<code>/a&lt;b&gt;&amp;c</code>"));
    }

    #[tokio::test]
    async fn test_check_database() {
        let (service, _rx) = service();
        assert_eq!(service.check_database().await.unwrap(), 3);

        let broken = SiteService::new(
            Arc::new(BrokenDatabase),
            ContentResolver::new(Arc::new(store()), &SiteConfig::default()),
            Arc::new(sitehost_notify::LogNotifier),
        );
        assert!(matches!(
            broken.check_database().await,
            Err(CoreError::DatabaseUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_short_id_by_device() {
        let (service, _rx) = service();
        let path = format!("/{ID}");

        let outcome = service.handle(&request("up.com", &path, IPHONE)).await.unwrap();
        assert_eq!(body(outcome), Bytes::from_static(b"landing-mobile"));

        let outcome = service.handle(&request("up.com", &path, DESKTOP)).await.unwrap();
        assert_eq!(body(outcome), Bytes::from_static(b"landing-index"));
    }

    #[tokio::test]
    async fn test_tag_gated_falls_through_to_static() {
        // blog.com has no allowed tag; the short-id path then goes through the
        // static lookup, which finds a directory of that name
        let (service, _rx) = service();
        let path = format!("/{ID}");

        let outcome = service.handle(&request("blog.com", &path, IPHONE)).await.unwrap();
        assert_eq!(body(outcome), Bytes::from_static(b"blog-dir"));
    }

    #[tokio::test]
    async fn test_static_and_device_routes() {
        let (service, _rx) = service();

        let outcome = service.handle(&request("blog.com", "/about.html", DESKTOP)).await.unwrap();
        assert_eq!(body(outcome), Bytes::from_static(b"blog-about"));

        let outcome = service.handle(&request("up.com", "/mobile/offer", DESKTOP)).await.unwrap();
        assert_eq!(body(outcome), Bytes::from_static(b"mobile-offer"));

        let outcome = service.handle(&request("up.com", "/mobile/gone", DESKTOP)).await.unwrap();
        assert_eq!(body(outcome), Bytes::from_static(b"landing-mobile"));

        let outcome = service.handle(&request("up.com", "/", DESKTOP)).await.unwrap();
        assert_eq!(body(outcome), Bytes::from_static(b"landing-index"));
    }

    #[tokio::test]
    async fn test_not_found_kinds() {
        let (service, _rx) = service();

        let outcome = service.handle(&request("up.com", "/missing.txt", DESKTOP)).await.unwrap();
        assert!(matches!(outcome, Outcome::NotFound(NotFoundKind::Generic)));

        let outcome = service.handle(&request("unknown.com", "/desktop/x", DESKTOP)).await.unwrap();
        assert!(matches!(outcome, Outcome::NotFound(NotFoundKind::Desktop)));
    }

    #[tokio::test]
    async fn test_detect_redirect() {
        let (service, _rx) = service();
        let req = SiteRequest {
            query: Some("token=abc"),
            ..request("unknown.com", "/detect/offer", IPHONE)
        };

        match service.handle(&req).await.unwrap() {
            Outcome::DeviceRedirect { location } => assert_eq!(location, "/mobile/offer?token=abc"),
            other => panic!("expected device redirect, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_database_failure() {
        let service = SiteService::new(
            Arc::new(BrokenDatabase),
            ContentResolver::new(Arc::new(store()), &SiteConfig::default()),
            Arc::new(sitehost_notify::LogNotifier),
        );

        let result = service.handle(&request("up.com", "/", DESKTOP)).await;
        assert!(matches!(result, Err(CoreError::DatabaseUnavailable(_))));

        // Skipped prefixes never touch the database
        let outcome = service.handle(&request("up.com", "/api/status", DESKTOP)).await.unwrap();
        assert!(matches!(outcome, Outcome::NotFound(NotFoundKind::Generic)));
    }
}
