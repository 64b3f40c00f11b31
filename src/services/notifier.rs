// src/services/notifier.rs

//! Notification delivery for new postings.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{NotifierConfig, Posting};
use crate::utils::truncate_graphemes;

/// Descriptions longer than this many characters are cut in messages.
pub const DESCRIPTION_LIMIT: usize = 200;

/// Delivers one message per new posting.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, posting: &Posting) -> Result<()>;
}

/// Sends postings to a Telegram chat through the Bot API.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    chat_id: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

impl TelegramNotifier {
    pub fn new(bot_token: &str, chat_id: &str, config: &NotifierConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.api_base.trim_end_matches('/'),
                bot_token
            ),
            chat_id: chat_id.to_string(),
        })
    }

    /// Send an HTML-formatted message to the configured chat.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: false,
        };

        // The endpoint embeds the bot token; keep it out of error messages.
        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::notify(format!(
                "Telegram returned {status}: {}",
                body.trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, posting: &Posting) -> Result<()> {
        self.send_message(&format_posting_message(posting)).await
    }
}

/// Render a posting as a Telegram HTML message.
pub fn format_posting_message(posting: &Posting) -> String {
    let mut message = format!(
        "🆕 <b>New job posted</b>\n\n\
         🏢 <b>Company:</b> {}\n\
         💼 <b>Position:</b> {}\n\
         🔗 <a href=\"{}\">View job</a>\n\
         📅 Found: {}",
        html_escape::encode_text(&posting.company),
        html_escape::encode_text(&posting.title),
        html_escape::encode_double_quoted_attribute(&posting.url),
        posting.discovered_label(),
    );

    if let Some(description) = &posting.description {
        let snippet = truncate_graphemes(description, DESCRIPTION_LIMIT);
        message.push_str("\n\n📝 ");
        message.push_str(&html_escape::encode_text(&snippet));
    }
    message
}
