//! Status fetcher — one request to the status API per call.

use std::time::Duration;

use async_trait::async_trait;
use hwbot_core::config::ApiConfig;
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::PollError;
use crate::record::Cursor;

/// Longest slice of an error body kept in a `Service` error.
const ERROR_BODY_LIMIT: usize = 200;

/// Source of raw status payloads.
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    /// Fetch statuses changed since `cursor`, decoded but not validated.
    async fn fetch(&self, cursor: Cursor) -> Result<Value, PollError>;
}

/// Fetches statuses over HTTP with an OAuth token.
pub struct HttpStatusFetcher {
    endpoint: String,
    token: String,
    client: reqwest::Client,
}

impl HttpStatusFetcher {
    pub fn new(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> hwbot_core::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            token: token.into(),
            client,
        })
    }

    pub fn from_config(config: &ApiConfig, token: impl Into<String>) -> hwbot_core::Result<Self> {
        Self::new(
            config.endpoint.clone(),
            token,
            Duration::from_secs(config.request_timeout_secs),
        )
    }
}

#[async_trait]
impl StatusFetcher for HttpStatusFetcher {
    async fn fetch(&self, cursor: Cursor) -> Result<Value, PollError> {
        tracing::debug!("GET {} from_date={}", self.endpoint, cursor);

        let response = self
            .client
            .get(&self.endpoint)
            .header("Authorization", format!("OAuth {}", self.token))
            .query(&[("from_date", cursor.as_secs())])
            .send()
            .await
            .map_err(|e| PollError::Transport(describe_transport(&e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PollError::Transport(format!("reading body failed: {e}")))?;

        if status != StatusCode::OK {
            return Err(PollError::Service {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| PollError::Decode(e.to_string()))
    }
}

fn describe_transport(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        format!("request failed: {e}")
    }
}
