//! Request path classification

use crate::device::DeviceVariant;

/// Length of the alphanumeric short IDs used by dynamic routes
pub const SHORT_ID_LEN: usize = 24;

/// Shared resource directories served from the resources root
pub const RESOURCE_DIRS: [&str; 3] = ["images", "scripts", "styles"];

/// Prefixes that never go through project lookup
pub const SKIPPED_PREFIXES: [&str; 2] = ["/api/", "/static/"];

const DETECT_PREFIX: &str = "/detect/";

/// Shape of a request path, as far as content resolution is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteShape<'a> {
    /// `/{id}`
    ShortId { id: &'a str },
    /// `/{id}/{file id}_{name}.html`; `name` has no `.html` suffix
    IdFile {
        id: &'a str,
        file_id: &'a str,
        name: &'a str,
    },
    /// `/mobile/*` or `/desktop/*`
    Device { variant: DeviceVariant, rest: &'a str },
    /// `/`
    Root,
    /// Anything else; served by the generic static lookup
    Other,
}

fn is_short_id(s: &str) -> bool {
    s.len() == SHORT_ID_LEN && s.bytes().all(|b| b.is_ascii_alphanumeric())
}

impl<'a> RouteShape<'a> {
    pub fn parse(path: &'a str) -> Self {
        if path == "/" {
            return RouteShape::Root;
        }

        if let Some(rest) = path.strip_prefix("/mobile/") {
            return RouteShape::Device {
                variant: DeviceVariant::Mobile,
                rest,
            };
        }
        if let Some(rest) = path.strip_prefix("/desktop/") {
            return RouteShape::Device {
                variant: DeviceVariant::Desktop,
                rest,
            };
        }

        let Some(trimmed) = path.strip_prefix('/') else {
            return RouteShape::Other;
        };
        // A single trailing slash is tolerated
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

        match trimmed.split_once('/') {
            None if is_short_id(trimmed) => RouteShape::ShortId { id: trimmed },
            Some((id, file)) if is_short_id(id) => Self::parse_id_file(id, file),
            _ => RouteShape::Other,
        }
    }

    fn parse_id_file(id: &'a str, file: &'a str) -> Self {
        let Some(stem) = file.strip_suffix(".html") else {
            return RouteShape::Other;
        };
        match stem.split_once('_') {
            Some((file_id, name))
                if is_short_id(file_id) && !name.is_empty() && !name.contains('/') =>
            {
                RouteShape::IdFile { id, file_id, name }
            }
            _ => RouteShape::Other,
        }
    }

    /// Whether this is one of the tag-gated dynamic shapes
    pub fn is_dynamic(&self) -> bool {
        matches!(self, RouteShape::ShortId { .. } | RouteShape::IdFile { .. })
    }
}

/// Split a shared resource path into its directory and the remainder,
/// e.g. `/images/a/b.png` into `("images", "a/b.png")`.
pub fn resource_path(path: &str) -> Option<(&'static str, &str)> {
    RESOURCE_DIRS.iter().find_map(|dir| {
        path.strip_prefix('/')
            .and_then(|p| p.strip_prefix(dir))
            .and_then(|p| p.strip_prefix('/'))
            .map(|rest| (*dir, rest))
    })
}

/// Whether the path bypasses project lookup
pub fn is_skipped(path: &str) -> bool {
    SKIPPED_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Target of a `/detect/*` device redirect, with the query string preserved
pub fn detect_redirect(path: &str, query: Option<&str>, variant: DeviceVariant) -> Option<String> {
    let rest = path.strip_prefix(DETECT_PREFIX)?;
    let mut target = format!("/{}/{}", variant.as_str(), rest);

    if let Some(query) = query.filter(|q| !q.is_empty()) {
        target.push('?');
        target.push_str(query);
    }

    Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "a1B2c3D4e5F6g7H8i9J0k1L2";
    const FILE_ID: &str = "Z9y8X7w6V5u4T3s2R1q0P9o8";

    #[test]
    fn test_parse_short_id() {
        assert_eq!(
            RouteShape::parse(&format!("/{ID}")),
            RouteShape::ShortId { id: ID }
        );
        assert_eq!(
            RouteShape::parse(&format!("/{ID}/")),
            RouteShape::ShortId { id: ID }
        );
        // Wrong length or characters
        assert_eq!(RouteShape::parse("/abc"), RouteShape::Other);
        assert_eq!(
            RouteShape::parse("/a1B2c3D4e5F6g7H8i9J0k1L-"),
            RouteShape::Other
        );
    }

    #[test]
    fn test_parse_id_file() {
        let path = format!("/{ID}/{FILE_ID}_landing.html");
        assert_eq!(
            RouteShape::parse(&path),
            RouteShape::IdFile {
                id: ID,
                file_id: FILE_ID,
                name: "landing"
            }
        );

        // Everything after the first underscore is the name
        let path = format!("/{ID}/{FILE_ID}_promo_v2.html");
        assert!(matches!(
            RouteShape::parse(&path),
            RouteShape::IdFile { name: "promo_v2", .. }
        ));

        assert_eq!(
            RouteShape::parse(&format!("/{ID}/{FILE_ID}_.html")),
            RouteShape::Other
        );
        assert_eq!(
            RouteShape::parse(&format!("/{ID}/{FILE_ID}_x.htm")),
            RouteShape::Other
        );
        assert_eq!(
            RouteShape::parse(&format!("/{ID}/short_x.html")),
            RouteShape::Other
        );
    }

    #[test]
    fn test_parse_device_and_root() {
        assert_eq!(RouteShape::parse("/"), RouteShape::Root);
        assert_eq!(
            RouteShape::parse("/mobile/offer/today"),
            RouteShape::Device {
                variant: DeviceVariant::Mobile,
                rest: "offer/today"
            }
        );
        assert_eq!(
            RouteShape::parse("/desktop/"),
            RouteShape::Device {
                variant: DeviceVariant::Desktop,
                rest: ""
            }
        );
        assert_eq!(RouteShape::parse("/mobile"), RouteShape::Other);
        assert_eq!(RouteShape::parse("/about.html"), RouteShape::Other);
    }

    #[test]
    fn test_resource_path() {
        assert_eq!(resource_path("/images/a/b.png"), Some(("images", "a/b.png")));
        assert_eq!(resource_path("/styles/site.css"), Some(("styles", "site.css")));
        assert_eq!(resource_path("/imagesx/a.png"), None);
        assert_eq!(resource_path("/images"), None);
    }

    #[test]
    fn test_detect_redirect() {
        assert_eq!(
            detect_redirect("/detect/promo", Some("token=abc&x=1"), DeviceVariant::Mobile),
            Some("/mobile/promo?token=abc&x=1".to_string())
        );
        assert_eq!(
            detect_redirect("/detect/a/b", None, DeviceVariant::Desktop),
            Some("/desktop/a/b".to_string())
        );
        assert_eq!(detect_redirect("/detector", None, DeviceVariant::Desktop), None);
    }

    #[test]
    fn test_is_skipped() {
        assert!(is_skipped("/api/status"));
        assert!(is_skipped("/static/app.js"));
        assert!(!is_skipped("/apix"));
    }
}
