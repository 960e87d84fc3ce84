//! Sitehost Notifications
//!
//! This crate provides the outbound operational notifier: a Telegram bot
//! sender plus a log-only fallback, and a fire-and-forget dispatch helper
//! that keeps notification latency off the response path.

pub mod error;
pub mod notifier;
pub mod telegram;

pub use error::NotifyError;
pub use notifier::{dispatch, LogNotifier, Notifier};
pub use telegram::{escape_html, TelegramConfig, TelegramNotifier};
