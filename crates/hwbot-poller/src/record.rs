//! Poll cursor and status records.

use serde_json::Value;

/// Lower bound of the next poll window, as a Unix timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor(pub i64);

impl Cursor {
    /// Cursor for the current wall-clock time.
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp())
    }

    pub fn as_secs(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of the `homeworks` list.
///
/// Fields stay optional here; the interpreter decides whether a missing
/// one is an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusRecord {
    pub name: Option<String>,
    pub status: Option<String>,
}

impl StatusRecord {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            status: Some(status.into()),
        }
    }

    /// Extract a record from one JSON element. The service calls the
    /// identifier `homework_name`; a plain `name` is accepted too.
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_owned);
        Self {
            name: text("homework_name").or_else(|| text("name")),
            status: text("status"),
        }
    }
}
