//! Poll failure taxonomy and routing policy.

use thiserror::Error;

/// Every way a poll iteration can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("Status API unreachable: {0}")]
    Transport(String),

    #[error("Status API returned HTTP {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Status API payload is not valid JSON: {0}")]
    Decode(String),

    #[error("Unexpected response shape: {0}")]
    Shape(String),

    #[error("Bad current_date in response: {0}")]
    Cursor(String),

    #[error("Status record is missing '{0}'")]
    MissingField(&'static str),

    #[error("Undocumented homework status '{0}'")]
    UnknownStatus(String),

    #[error("Notification was not delivered: {0}")]
    Delivery(String),
}

/// What the loop does with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log and tell the operator chat.
    Report,
    /// Log only.
    Silent,
}

impl PollError {
    pub fn policy(&self) -> FailurePolicy {
        match self {
            PollError::Transport(_)
            | PollError::Service { .. }
            | PollError::Decode(_)
            | PollError::Shape(_)
            | PollError::MissingField(_) => FailurePolicy::Report,
            PollError::Cursor(_) | PollError::UnknownStatus(_) | PollError::Delivery(_) => {
                FailurePolicy::Silent
            }
        }
    }

    /// Stable short name for logs and outcomes.
    pub fn kind(&self) -> &'static str {
        match self {
            PollError::Transport(_) => "transport",
            PollError::Service { .. } => "service",
            PollError::Decode(_) => "decode",
            PollError::Shape(_) => "shape",
            PollError::Cursor(_) => "cursor",
            PollError::MissingField(_) => "missing_field",
            PollError::UnknownStatus(_) => "unknown_status",
            PollError::Delivery(_) => "delivery",
        }
    }
}
