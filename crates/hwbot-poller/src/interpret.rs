//! Status interpretation — status code to human-readable message.

use std::collections::HashMap;

use crate::error::PollError;
use crate::record::StatusRecord;

/// Known status codes and their verdict texts.
#[derive(Debug, Clone)]
pub struct VerdictTable {
    verdicts: HashMap<String, String>,
}

impl VerdictTable {
    /// The three statuses the review service documents.
    pub fn standard() -> Self {
        Self::from_pairs([
            (
                "approved",
                "Работа проверена: ревьюеру всё понравилось. Ура!",
            ),
            ("reviewing", "Работа взята на проверку ревьюером."),
            ("rejected", "Работа проверена: у ревьюера есть замечания."),
        ])
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            verdicts: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn verdict(&self, status: &str) -> Option<&str> {
        self.verdicts.get(status).map(String::as_str)
    }
}

impl Default for VerdictTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Turns the newest status record into a notification text.
#[derive(Debug, Clone, Default)]
pub struct StatusInterpreter {
    verdicts: VerdictTable,
}

impl StatusInterpreter {
    pub fn new(verdicts: VerdictTable) -> Self {
        Self { verdicts }
    }

    /// The record to report this iteration: the first one, since the
    /// service lists newest first.
    pub fn latest(records: &[StatusRecord]) -> Option<&StatusRecord> {
        records.first()
    }

    pub fn interpret(&self, record: &StatusRecord) -> Result<String, PollError> {
        let name = record
            .name
            .as_deref()
            .ok_or(PollError::MissingField("homework_name"))?;
        let status = record
            .status
            .as_deref()
            .ok_or(PollError::MissingField("status"))?;
        let verdict = self
            .verdicts
            .verdict(status)
            .ok_or_else(|| PollError::UnknownStatus(status.to_string()))?;
        Ok(format!(
            "Изменился статус проверки работы \"{name}\". {verdict}"
        ))
    }
}
