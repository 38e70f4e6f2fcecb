//! Notifier — sends messages through the chat channel.
//! Any channel fault becomes `PollError::Delivery`; retrying is the loop's job.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hwbot_core::traits::Channel;
use hwbot_core::types::OutgoingMessage;

use crate::error::PollError;

/// Delivered notifications kept in memory.
const HISTORY_LIMIT: usize = 100;

/// A message that reached the channel.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveredNotification {
    pub text: String,
    pub delivered_at: DateTime<Utc>,
}

/// Delivery endpoint: one channel, one chat.
pub struct Notifier {
    channel: Arc<dyn Channel>,
    chat_id: String,
    history: VecDeque<DeliveredNotification>,
}

impl Notifier {
    pub fn new(channel: Arc<dyn Channel>, chat_id: impl Into<String>) -> Self {
        Self {
            channel,
            chat_id: chat_id.into(),
            history: VecDeque::new(),
        }
    }

    pub async fn notify(&mut self, text: &str) -> Result<(), PollError> {
        let message = OutgoingMessage::new(self.chat_id.clone(), text);
        self.channel
            .send(message)
            .await
            .map_err(|e| PollError::Delivery(e.to_string()))?;

        tracing::info!("Message sent via {}: {}", self.channel.name(), text);
        self.history.push_back(DeliveredNotification {
            text: text.to_string(),
            delivered_at: Utc::now(),
        });
        if self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }
        Ok(())
    }

    /// Delivered notifications, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &DeliveredNotification> {
        self.history.iter()
    }

    pub fn delivered_count(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hwbot_core::error::{HwBotError, Result};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<OutgoingMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl Channel for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn send(&self, message: OutgoingMessage) -> Result<()> {
            if self.fail {
                return Err(HwBotError::Channel("Too Many Requests".into()));
            }
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_notify_targets_configured_chat() {
        let channel = Arc::new(Recorder::default());
        let mut notifier = Notifier::new(channel.clone(), "555");

        notifier.notify("hello").await.unwrap();

        let sent = channel.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].thread_id, "555");
        assert_eq!(sent[0].content, "hello");
        assert_eq!(notifier.delivered_count(), 1);
    }

    #[tokio::test]
    async fn test_channel_fault_becomes_delivery_error() {
        let channel = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        let mut notifier = Notifier::new(channel, "555");

        match notifier.notify("hello").await {
            Err(PollError::Delivery(msg)) => assert!(msg.contains("Too Many Requests")),
            other => panic!("expected delivery error, got {other:?}"),
        }
        assert_eq!(notifier.delivered_count(), 0);
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let mut notifier = Notifier::new(Arc::new(Recorder::default()), "1");
        for i in 0..(HISTORY_LIMIT + 5) {
            notifier.notify(&format!("msg {i}")).await.unwrap();
        }
        assert_eq!(notifier.delivered_count(), HISTORY_LIMIT);
        assert_eq!(notifier.history().next().unwrap().text, "msg 5");
    }
}
