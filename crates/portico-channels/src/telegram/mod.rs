//! Telegram Bot API bindings.
//!
//! Inbound updates arrive over the gateway's webhook; this module validates
//! them (`envelope`) and sends replies via `sendMessage` and
//! `answerCallbackQuery`. Docs: <https://core.telegram.org/bots/api>

pub mod envelope;
pub mod types;


use async_trait::async_trait;
use portico_core::{error::PorticoError, traits::Messenger};
use tracing::{debug, warn};

/// Telegram's hard limit on message text length.
const MAX_MESSAGE_LEN: usize = 4096;

/// Outbound Telegram Bot API client.
pub struct TelegramApi {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramApi {
    /// Create a client for the given bot token.
    pub fn new(bot_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("https://api.telegram.org/bot{bot_token}"),
        }
    }

    /// Send one chunk, retrying as plain text when Telegram rejects the
    /// HTML entities.
    async fn send_chunk(&self, chat_id: &str, chunk: &str) -> Result<(), PorticoError> {
        let url = format!("{}/sendMessage", self.base_url);
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": chunk,
            "parse_mode": "HTML",
        });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PorticoError::Channel(format!("telegram send failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            if error_text.contains("can't parse entities") {
                debug!("HTML parse failed, retrying as plain text");
                let plain_body = serde_json::json!({
                    "chat_id": chat_id,
                    "text": chunk,
                });
                self.client
                    .post(&url)
                    .json(&plain_body)
                    .send()
                    .await
                    .map_err(|e| {
                        PorticoError::Channel(format!("telegram send (plain) failed: {e}"))
                    })?;
            } else {
                warn!("telegram send got {status}: {error_text}");
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramApi {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), PorticoError> {
        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            self.send_chunk(chat_id, chunk).await?;
        }
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), PorticoError> {
        let url = format!("{}/answerCallbackQuery", self.base_url);
        let body = serde_json::json!({
            "callback_query_id": callback_id,
        });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PorticoError::Channel(format!("telegram answerCallback failed: {e}")))?;

        let status = resp.status();
        let body: types::TgResponse<bool> = resp
            .json()
            .await
            .map_err(|e| PorticoError::Channel(format!("telegram answerCallback parse: {e}")))?;

        if !body.ok || body.result != Some(true) {
            return Err(PorticoError::Channel(format!(
                "telegram answerCallback got {status}: {}",
                body.description.unwrap_or_default()
            )));
        }

        Ok(())
    }
}

/// Split text into chunks under `max_len`, preferring newline boundaries.
fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    if text.len() <= max_len {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let end = (start + max_len).min(text.len());
        let break_at = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .map(|i| start + i + 1)
                .unwrap_or(end)
        } else {
            end
        };
        chunks.push(&text[start..break_at]);
        start = break_at;
    }

    chunks
}
