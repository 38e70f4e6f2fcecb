//! HwBot configuration system.
//!
//! Settings come from an optional TOML file; credentials and a few
//! overrides are then read from the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{HwBotError, Result};

pub const ENV_PRACTICUM_TOKEN: &str = "PRACTICUM_TOKEN";
pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const ENV_ENDPOINT: &str = "HWBOT_ENDPOINT";
pub const ENV_RETRY_SECS: &str = "HWBOT_RETRY_SECS";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HwBotConfig {
    #[serde(default)]
    pub practicum_token: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl HwBotConfig {
    /// Load config from the default path (~/.hwbot/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| HwBotError::Config(format!("Failed to read config: {e}")))?;
        Self::parse(&content)
    }

    /// Parse config from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| HwBotError::Config(format!("Failed to parse config: {e}")))
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".hwbot")
            .join("config.toml")
    }

    /// Overlay values from the environment. Empty variables are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_PRACTICUM_TOKEN) {
            self.practicum_token = v;
        }
        if let Some(v) = get(ENV_TELEGRAM_TOKEN) {
            self.telegram.bot_token = v;
        }
        if let Some(v) = get(ENV_TELEGRAM_CHAT_ID) {
            self.telegram.chat_id = v;
        }
        if let Some(v) = get(ENV_ENDPOINT) {
            self.api.endpoint = v;
        }
        if let Some(v) = get(ENV_RETRY_SECS) {
            self.poller.retry_interval_secs = v
                .trim()
                .parse()
                .map_err(|e| HwBotError::Config(format!("Invalid {ENV_RETRY_SECS}: {e}")))?;
        }
        Ok(())
    }

    /// Overlay values from the process environment.
    pub fn apply_process_env(&mut self) -> Result<()> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Collect the three required credentials.
    /// Every missing one is named in the error, not just the first.
    pub fn credentials(&self) -> Result<Credentials> {
        let mut missing = Vec::new();
        if self.practicum_token.trim().is_empty() {
            missing.push(ENV_PRACTICUM_TOKEN);
        }
        if self.telegram.bot_token.trim().is_empty() {
            missing.push(ENV_TELEGRAM_TOKEN);
        }
        if self.telegram.chat_id.trim().is_empty() {
            missing.push(ENV_TELEGRAM_CHAT_ID);
        }
        if !missing.is_empty() {
            return Err(HwBotError::MissingCredentials(missing));
        }
        Ok(Credentials {
            api_token: self.practicum_token.clone(),
            bot_token: self.telegram.bot_token.clone(),
            chat_id: self.telegram.chat_id.clone(),
        })
    }
}

/// Validated startup credentials.
#[derive(Clone)]
pub struct Credentials {
    pub api_token: String,
    pub bot_token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_token", &"***")
            .field("bot_token", &"***")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Status API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://practicum.yandex.ru/api/user_api/homework_statuses/".into()
}
fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Poll loop cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    #[serde(default = "default_retry_interval")]
    pub retry_interval_secs: u64,
}

fn default_retry_interval() -> u64 {
    600
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            retry_interval_secs: default_retry_interval(),
        }
    }
}

/// Telegram delivery channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
    #[serde(default = "default_telegram_api")]
    pub api_base: String,
    #[serde(default = "default_send_timeout")]
    pub timeout_secs: u64,
}

fn default_telegram_api() -> String {
    "https://api.telegram.org".into()
}
fn default_send_timeout() -> u64 {
    10
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: default_telegram_api(),
            timeout_secs: default_send_timeout(),
        }
    }
}

/// Log output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_log_file")]
    pub file: String,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_dir() -> String {
    ".".into()
}
fn default_log_file() -> String {
    "main.log".into()
}
fn default_log_filter() -> String {
    "info".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}
