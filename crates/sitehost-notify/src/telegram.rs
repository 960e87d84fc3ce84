//! Telegram bot notifier

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::NotifyError;
use crate::notifier::Notifier;

const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Telegram notifier configuration
#[derive(Clone, Debug, Default)]
pub struct TelegramConfig {
    /// Bot token; notifications are skipped when absent
    pub bot_token: Option<String>,
    /// Target chat ID; notifications are skipped when absent
    pub chat_id: Option<String>,
    /// Optional forum thread ID
    pub thread_id: Option<String>,
    /// Override for the Bot API base URL
    pub api_url: Option<String>,
}

/// sendMessage request body
#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<&'a str>,
}

/// Telegram Bot API notifier
pub struct TelegramNotifier {
    config: TelegramConfig,
    client: Client,
}

impl TelegramNotifier {
    /// Create a new Telegram notifier
    pub fn new(config: TelegramConfig) -> Result<Self, NotifyError> {
        let client = Client::builder().build()?;

        if config.bot_token.is_some() && config.chat_id.is_some() {
            info!("Telegram notifications enabled");
        } else {
            info!("Telegram bot token or chat ID missing, notifications will only be logged");
        }

        Ok(Self { config, client })
    }

    /// Get the sendMessage endpoint for a token
    fn send_url(&self, token: &str) -> String {
        let base = self.config.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
        format!("{}/bot{}/sendMessage", base.trim_end_matches('/'), token)
    }

    fn request_body<'a>(&'a self, chat_id: &'a str, text: &'a str) -> SendMessage<'a> {
        SendMessage {
            chat_id,
            text,
            disable_web_page_preview: true,
            parse_mode: "HTML",
            message_thread_id: self.config.thread_id.as_deref(),
        }
    }
}

/// Escape text for interpolation into an HTML `parse_mode` message.
///
/// Telegram rejects the whole message when it contains a stray `<` or `&`.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        info!("{}", message);

        let (Some(token), Some(chat_id)) = (&self.config.bot_token, &self.config.chat_id) else {
            debug!("Missing bot token or chat ID, skipping Telegram notification");
            return Ok(());
        };

        let response = self
            .client
            .post(self.send_url(token))
            .json(&self.request_body(chat_id, message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Error sending Telegram message: {} {}", status, message);
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
