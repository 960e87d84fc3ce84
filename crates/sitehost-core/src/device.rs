//! User-agent based device classification

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

static MOBILE_UA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Android|webOS|iPhone|iPad|iPod|BlackBerry|IEMobile|Opera Mini|Mobile|CriOS")
        .expect("mobile user-agent pattern is valid")
});

static TABLET_UA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)iPad|tablet|Tab").expect("tablet user-agent pattern is valid"));

static MACINTOSH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Macintosh").expect("pattern is valid"));
static SAFARI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Safari").expect("pattern is valid"));
static CHROME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Chrome").expect("pattern is valid"));

/// Device class derived from a user-agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Tablet => "tablet",
            DeviceClass::Desktop => "desktop",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the user-agent looks like a phone or tablet
pub fn is_mobile(user_agent: &str) -> bool {
    !user_agent.is_empty() && MOBILE_UA.is_match(user_agent)
}

/// Whether the user-agent looks like a tablet, including iPads that report a
/// desktop Safari user-agent.
pub fn is_tablet(user_agent: &str) -> bool {
    if user_agent.is_empty() {
        return false;
    }

    let desktop_ipad = MACINTOSH.is_match(user_agent)
        && SAFARI.is_match(user_agent)
        && !CHROME.is_match(user_agent);

    TABLET_UA.is_match(user_agent) || desktop_ipad
}

/// Classify a user-agent. Tablet wins over mobile; empty is desktop.
pub fn classify(user_agent: &str) -> DeviceClass {
    if is_tablet(user_agent) {
        DeviceClass::Tablet
    } else if is_mobile(user_agent) {
        DeviceClass::Mobile
    } else {
        DeviceClass::Desktop
    }
}

/// The two page variants a site can provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceVariant {
    Mobile,
    Desktop,
}

impl DeviceVariant {
    /// Variant chosen by the mobile predicate alone
    pub fn from_user_agent(user_agent: &str) -> Self {
        if is_mobile(user_agent) {
            DeviceVariant::Mobile
        } else {
            DeviceVariant::Desktop
        }
    }

    /// Directory and filename prefix, `mobile` or `desktop`
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceVariant::Mobile => "mobile",
            DeviceVariant::Desktop => "desktop",
        }
    }

    /// Variant page name, `mobile.html` or `desktop.html`
    pub fn page(&self) -> &'static str {
        match self {
            DeviceVariant::Mobile => "mobile.html",
            DeviceVariant::Desktop => "desktop.html",
        }
    }
}

impl fmt::Display for DeviceVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the resolver needs to know about the client device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Device {
    pub class: DeviceClass,
    pub variant: DeviceVariant,
}

impl Device {
    pub fn detect(user_agent: &str) -> Self {
        Self {
            class: classify(user_agent),
            variant: DeviceVariant::from_user_agent(user_agent),
        }
    }
}
