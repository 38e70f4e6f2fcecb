//! Error types shared across HwBot crates.

use thiserror::Error;

/// Top-level HwBot error.
#[derive(Debug, Error)]
pub enum HwBotError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, HwBotError>;
