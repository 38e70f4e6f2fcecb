//! Response validation — shape checks and cursor extraction.

use serde_json::Value;

use crate::error::PollError;
use crate::record::{Cursor, StatusRecord};

/// A structurally valid response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    /// `homeworks` in the service's order (newest first). May be empty.
    pub records: Vec<StatusRecord>,
    /// Next cursor, or `PollError::Cursor` when `current_date` is unusable.
    /// The records above are valid either way.
    pub next_cursor: Result<Cursor, PollError>,
}

/// Check a decoded payload. Only a broken `homeworks` list fails the whole
/// response; a bad `current_date` is reported inside `Validated`.
pub fn validate(response: &Value) -> Result<Validated, PollError> {
    let Some(body) = response.as_object() else {
        return Err(PollError::Shape(format!(
            "response is {}, expected an object",
            type_name(response)
        )));
    };

    let homeworks = match body.get("homeworks") {
        None => return Err(PollError::Shape("'homeworks' key is missing".into())),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(PollError::Shape(format!(
                "'homeworks' is {}, expected a list",
                type_name(other)
            )));
        }
    };

    let next_cursor = match body.get("current_date") {
        None => Err(PollError::Cursor("'current_date' key is missing".into())),
        Some(v) => v
            .as_i64()
            .map(Cursor)
            .ok_or_else(|| PollError::Cursor(format!("'current_date' is not an integer: {v}"))),
    };

    Ok(Validated {
        records: homeworks.iter().map(StatusRecord::from_value).collect(),
        next_cursor,
    })
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
