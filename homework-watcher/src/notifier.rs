//! Telegram delivery
//!
//! Plain Bot API `sendMessage` over reqwest. The loop treats every failure here
//! as non-fatal.

use crate::config::Config;
use crate::error::NotifyError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Anything able to deliver a text message to the configured chat.
#[async_trait]
pub trait Notifier {
    async fn send_message(&self, text: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: Client,
    url: String,
    chat_id: String,
}

/// Bot API envelope. `result` is ignored.
#[derive(Debug, Deserialize)]
struct TgResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let url = format!(
            "{}/bot{}/sendMessage",
            config.telegram_api.trim_end_matches('/'),
            config.credentials.telegram_token()
        );

        Ok(Self {
            client,
            url,
            chat_id: config.credentials.telegram_chat_id().to_string(),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_message(&self, text: &str) -> Result<(), NotifyError> {
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
        });

        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();

        // Failures usually come as 4xx with {"ok": false, "description": ...}
        match response.json::<TgResponse>().await {
            Ok(body) if body.ok => Ok(()),
            Ok(body) => Err(NotifyError::Api {
                description: body
                    .description
                    .unwrap_or_else(|| format!("sendMessage failed with {status}")),
            }),
            Err(_) if !status.is_success() => Err(NotifyError::Api {
                description: format!("sendMessage failed with {status}"),
            }),
            Err(e) => Err(e.into()),
        }
    }
}
