//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sitehost_core::{AllowedTags, SiteConfig};
use sitehost_notify::TelegramConfig;
use std::path::{Path, PathBuf};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub site: SiteSection,
    #[serde(default)]
    pub telegram: TelegramSection,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Site resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSection {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_resources_root")]
    pub resources_root: PathBuf,
    /// Comma-separated list, e.g. `"landing, promo"`
    #[serde(default)]
    pub allowed_tags: String,
    #[serde(default = "default_override_dir")]
    pub override_dir: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            resources_root: default_resources_root(),
            allowed_tags: String::new(),
            override_dir: default_override_dir(),
        }
    }
}

/// Telegram notification configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramSection {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub thread_id: Option<String>,
    pub api_url: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Prometheus metrics configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    80
}

fn default_database_path() -> PathBuf {
    SiteConfig::default().database_path
}

fn default_resources_root() -> PathBuf {
    SiteConfig::default().resources_root
}

fn default_override_dir() -> String {
    sitehost_core::config::DEFAULT_OVERRIDE_DIR.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let mut config = Self::from_file(Path::new(path))?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Deployment environment variables take precedence over the file
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(path) = lookup("DATABASE_JSON_PATH") {
            self.site.database_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("RESOURCES_BASE_PATH") {
            self.site.resources_root = PathBuf::from(path);
        }
        if let Some(tags) = lookup("ALLOWED_TAGS") {
            self.site.allowed_tags = tags;
        }
        if let Some(token) = lookup("INDEX_NEW_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(chat_id) = lookup("INDEX_NEW_GROUP_CHAT_ID") {
            self.telegram.chat_id = Some(chat_id);
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", port))?;
        }
        Ok(())
    }

    /// Settings for the resolution pipeline
    pub fn to_site_config(&self) -> SiteConfig {
        SiteConfig {
            database_path: self.site.database_path.clone(),
            resources_root: self.site.resources_root.clone(),
            allowed_tags: AllowedTags::parse(&self.site.allowed_tags),
            override_dir: self.site.override_dir.clone(),
        }
    }

    pub fn to_telegram_config(&self) -> TelegramConfig {
        TelegramConfig {
            bot_token: self.telegram.bot_token.clone().filter(|t| !t.is_empty()),
            chat_id: self.telegram.chat_id.clone().filter(|c| !c.is_empty()),
            thread_id: self.telegram.thread_id.clone(),
            api_url: self.telegram.api_url.clone(),
        }
    }
}
