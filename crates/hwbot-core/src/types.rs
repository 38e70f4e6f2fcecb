//! Message types passed to channels.

/// A message to deliver through a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    /// Destination chat/thread identifier.
    pub thread_id: String,
    /// Text body.
    pub content: String,
}

impl OutgoingMessage {
    pub fn new(thread_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            content: content.into(),
        }
    }
}
