//! Channel trait — outbound chat delivery.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::OutgoingMessage;

/// A chat delivery channel (Telegram, ...).
#[async_trait]
pub trait Channel: Send + Sync {
    /// Short channel name used in logs.
    fn name(&self) -> &str;

    /// Verify the channel is reachable. Default: nothing to check.
    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    /// Send one message. No retries.
    async fn send(&self, message: OutgoingMessage) -> Result<()>;
}
