//! Telegram Bot channel — message sending via Bot API.

use std::time::Duration;

use async_trait::async_trait;
use hwbot_core::config::TelegramConfig;
use hwbot_core::error::{HwBotError, Result};
use hwbot_core::traits::Channel;
use hwbot_core::types::OutgoingMessage;
use serde::{Deserialize, Serialize};

/// Telegram Bot channel bound to one bot token.
///
/// The token is part of every request URL, so transport errors are
/// stripped of their URL before they are surfaced.
pub struct TelegramChannel {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    /// Send a plain text message.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(HwBotError::Channel("Refusing to send empty message".into()));
        }
        if chat_id.trim().is_empty() {
            return Err(HwBotError::Channel("Missing chat_id".into()));
        }

        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| HwBotError::Channel(format!("sendMessage failed: {}", e.without_url())))?;

        let status = response.status();
        let result: TelegramApiResponse<serde_json::Value> = response.json().await.map_err(|e| {
            HwBotError::Channel(format!(
                "Invalid send response (HTTP {status}): {}",
                e.without_url()
            ))
        })?;

        if !status.is_success() || !result.ok {
            return Err(HwBotError::Channel(format!(
                "Send failed (HTTP {status}): {}",
                result.description.unwrap_or_default()
            )));
        }
        Ok(())
    }

    /// Get bot info.
    pub async fn get_me(&self) -> Result<TelegramUser> {
        let response = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| HwBotError::Channel(format!("getMe failed: {}", e.without_url())))?;
        let body: TelegramApiResponse<TelegramUser> = response
            .json()
            .await
            .map_err(|e| {
                HwBotError::Channel(format!("Invalid getMe response: {}", e.without_url()))
            })?;
        if !body.ok {
            return Err(HwBotError::Channel(format!(
                "getMe rejected: {}",
                body.description.unwrap_or_default()
            )));
        }
        body.result
            .ok_or_else(|| HwBotError::Channel("No bot info".into()))
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn connect(&self) -> Result<()> {
        let me = self.get_me().await?;
        tracing::info!(
            "Telegram bot: @{} ({})",
            me.username.as_deref().unwrap_or("unknown"),
            me.first_name
        );
        Ok(())
    }

    async fn send(&self, message: OutgoingMessage) -> Result<()> {
        self.send_message(&message.thread_id, &message.content).await
    }
}

// --- Telegram API Types ---

#[derive(Debug, Deserialize)]
pub struct TelegramApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}
