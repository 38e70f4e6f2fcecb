//! Poll loop — fetch, validate, interpret, notify, sleep, repeat.
//! Every failure is caught here and routed by `PollError::policy`.

use std::time::Duration;

use hwbot_core::config::PollerConfig;
use tracing::Level;

use crate::error::{FailurePolicy, PollError};
use crate::fetcher::StatusFetcher;
use crate::interpret::StatusInterpreter;
use crate::notify::Notifier;
use crate::record::Cursor;
use crate::validate::validate;

/// Loop cadence.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Fixed pause after every iteration, successful or not.
    pub retry_interval: Duration,
}

impl LoopConfig {
    pub fn from_config(config: &PollerConfig) -> Self {
        Self {
            retry_interval: Duration::from_secs(config.retry_interval_secs),
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self::from_config(&PollerConfig::default())
    }
}

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Fetching,
    Validating,
    Interpreting,
    Notifying,
    Sleeping,
}

/// Result of one iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationOutcome {
    /// A status message reached the chat.
    Delivered,
    /// The response carried no records.
    NoUpdates,
    /// The cursor did not move and the message matches the last delivered
    /// one, so the service replayed the same window; not resent.
    Suppressed,
    /// The iteration failed; the error has already been routed.
    Failed(PollError),
}

/// Operator-facing prefix for reportable failures.
const FAILURE_PREFIX: &str = "Сбой в работе программы";

/// The polling daemon. Owns the cursor.
pub struct PollLoop {
    fetcher: Box<dyn StatusFetcher>,
    interpreter: StatusInterpreter,
    notifier: Notifier,
    config: LoopConfig,
    cursor: Cursor,
    state: LoopState,
    last_message: Option<String>,
    last_report: Option<String>,
}

impl PollLoop {
    /// Create a loop whose cursor starts at the current time.
    pub fn new(
        fetcher: Box<dyn StatusFetcher>,
        interpreter: StatusInterpreter,
        notifier: Notifier,
        config: LoopConfig,
    ) -> Self {
        Self {
            fetcher,
            interpreter,
            notifier,
            config,
            cursor: Cursor::now(),
            state: LoopState::Idle,
            last_message: None,
            last_report: None,
        }
    }

    /// Start from a specific cursor instead of now.
    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Run forever.
    pub async fn run(&mut self) {
        self.run_for(None).await;
    }

    /// Run `iterations` iterations, or forever with `None`.
    /// No sleep follows the final bounded iteration; `Some(0)` polls nothing.
    pub async fn run_for(&mut self, iterations: Option<u64>) -> Vec<IterationOutcome> {
        if iterations == Some(0) {
            return Vec::new();
        }
        tracing::info!(
            "Poll loop started (every {}s, cursor {})",
            self.config.retry_interval.as_secs(),
            self.cursor
        );
        let mut outcomes = Vec::new();
        let mut done = 0u64;
        loop {
            outcomes.push(self.run_once().await);
            done += 1;
            if iterations.is_some_and(|n| done >= n) {
                break;
            }
            self.state = LoopState::Sleeping;
            tokio::time::sleep(self.config.retry_interval).await;
        }
        self.state = LoopState::Idle;
        outcomes
    }

    /// One iteration without the trailing sleep. Never fails: errors are
    /// routed and returned as `IterationOutcome::Failed`.
    pub async fn run_once(&mut self) -> IterationOutcome {
        match self.poll().await {
            Ok(outcome) => {
                self.last_report = None;
                outcome
            }
            Err(err) => {
                self.route_failure(&err).await;
                IterationOutcome::Failed(err)
            }
        }
    }

    async fn poll(&mut self) -> Result<IterationOutcome, PollError> {
        self.state = LoopState::Fetching;
        let response = self.fetcher.fetch(self.cursor).await?;

        self.state = LoopState::Validating;
        let validated = validate(&response)?;
        let advanced = match validated.next_cursor {
            Ok(next) if next != self.cursor => {
                tracing::info!("Cursor advanced {} -> {}", self.cursor, next);
                self.cursor = next;
                true
            }
            Ok(_) => false,
            Err(err) => {
                self.log_failure(&err);
                false
            }
        };

        self.state = LoopState::Interpreting;
        let Some(record) = StatusInterpreter::latest(&validated.records) else {
            tracing::debug!("No new homework statuses");
            return Ok(IterationOutcome::NoUpdates);
        };
        let message = self.interpreter.interpret(record)?;

        if !advanced && self.last_message.as_deref() == Some(message.as_str()) {
            tracing::debug!("Same window replayed, not resending");
            return Ok(IterationOutcome::Suppressed);
        }

        self.state = LoopState::Notifying;
        self.notifier.notify(&message).await?;
        self.last_message = Some(message);
        Ok(IterationOutcome::Delivered)
    }

    async fn route_failure(&mut self, err: &PollError) {
        self.log_failure(err);
        match err.policy() {
            FailurePolicy::Silent => {}
            FailurePolicy::Report => {
                let report = format!("{FAILURE_PREFIX}: {err}");
                if self.last_report.as_deref() == Some(report.as_str()) {
                    tracing::debug!("Failure already reported, not resending");
                    return;
                }
                self.state = LoopState::Notifying;
                match self.notifier.notify(&report).await {
                    Ok(()) => self.last_report = Some(report),
                    // Logged only: reporting a failed report would loop.
                    Err(e) => tracing::error!("Could not report failure: {e}"),
                }
            }
        }
    }

    fn log_failure(&self, err: &PollError) {
        if failure_level(err) == Level::WARN {
            tracing::warn!(kind = err.kind(), cursor = %self.cursor, "{err}");
        } else {
            tracing::error!(kind = err.kind(), cursor = %self.cursor, "{err}");
        }
    }
}

/// Log level for a failure. Conditions the loop rides through are warnings.
fn failure_level(err: &PollError) -> Level {
    match err {
        PollError::Transport(_)
        | PollError::Service { .. }
        | PollError::Decode(_)
        | PollError::Shape(_)
        | PollError::MissingField(_)
        | PollError::Delivery(_) => Level::ERROR,
        PollError::Cursor(_) | PollError::UnknownStatus(_) => Level::WARN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hwbot_core::error::{HwBotError, Result as CoreResult};
    use hwbot_core::traits::Channel;
    use hwbot_core::types::OutgoingMessage;
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays canned responses and records the cursor of every call.
    struct Scripted {
        responses: Mutex<VecDeque<Result<Value, PollError>>>,
        seen: Arc<Mutex<Vec<Cursor>>>,
    }

    #[async_trait]
    impl StatusFetcher for Scripted {
        async fn fetch(&self, cursor: Cursor) -> Result<Value, PollError> {
            self.seen.lock().unwrap().push(cursor);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(PollError::Transport("script exhausted".into())))
        }
    }

    #[derive(Default)]
    struct Chat {
        sent: Mutex<Vec<String>>,
        failing: Mutex<bool>,
    }

    impl Chat {
        fn texts(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Channel for Chat {
        fn name(&self) -> &str {
            "test-chat"
        }

        async fn send(&self, message: OutgoingMessage) -> CoreResult<()> {
            if *self.failing.lock().unwrap() {
                return Err(HwBotError::Channel("chat unavailable".into()));
            }
            self.sent.lock().unwrap().push(message.content);
            Ok(())
        }
    }

    struct Harness {
        poller: PollLoop,
        chat: Arc<Chat>,
        seen: Arc<Mutex<Vec<Cursor>>>,
    }

    fn harness(responses: Vec<Result<Value, PollError>>) -> Harness {
        let chat = Arc::new(Chat::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let fetcher = Scripted {
            responses: Mutex::new(responses.into()),
            seen: seen.clone(),
        };
        let poller = PollLoop::new(
            Box::new(fetcher),
            StatusInterpreter::default(),
            Notifier::new(chat.clone(), "1"),
            LoopConfig {
                retry_interval: Duration::ZERO,
            },
        )
        .with_cursor(Cursor(500));
        Harness { poller, chat, seen }
    }

    fn approved(name: &str, date: i64) -> Result<Value, PollError> {
        Ok(json!({
            "homeworks": [{"homework_name": name, "status": "approved"}],
            "current_date": date
        }))
    }

    #[tokio::test]
    async fn test_known_status_delivers_once_and_advances_cursor() {
        let mut h = harness(vec![approved("X", 1000)]);

        assert_eq!(h.poller.run_once().await, IterationOutcome::Delivered);

        let texts = h.chat.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("X"));
        assert!(texts[0].contains("Работа проверена: ревьюеру всё понравилось. Ура!"));
        assert_eq!(h.poller.cursor(), Cursor(1000));
        assert_eq!(*h.seen.lock().unwrap(), vec![Cursor(500)]);
    }

    #[tokio::test]
    async fn test_empty_homeworks_sends_nothing() {
        let mut h = harness(vec![Ok(json!({"homeworks": [], "current_date": 1000}))]);

        assert_eq!(h.poller.run_once().await, IterationOutcome::NoUpdates);
        assert!(h.chat.texts().is_empty());
        assert_eq!(h.poller.cursor(), Cursor(1000));
    }

    #[tokio::test]
    async fn test_missing_current_date_keeps_cursor_and_still_notifies() {
        let mut h = harness(vec![Ok(json!({
            "homeworks": [{"homework_name": "X", "status": "reviewing"}]
        }))]);

        assert_eq!(h.poller.run_once().await, IterationOutcome::Delivered);
        assert_eq!(h.poller.cursor(), Cursor(500));
        assert_eq!(h.chat.texts().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_status_is_silent() {
        let mut h = harness(vec![Ok(json!({
            "homeworks": [{"homework_name": "X", "status": "lost_in_space"}],
            "current_date": 900
        }))]);

        let outcome = h.poller.run_once().await;
        assert_eq!(
            outcome,
            IterationOutcome::Failed(PollError::UnknownStatus("lost_in_space".into()))
        );
        assert!(h.chat.texts().is_empty());
        assert_eq!(h.poller.cursor(), Cursor(900));
    }

    #[tokio::test]
    async fn test_transport_error_is_reported_and_retried_with_same_cursor() {
        let mut h = harness(vec![
            Err(PollError::Transport("connection refused".into())),
            approved("X", 1000),
        ]);

        let outcomes = h.poller.run_for(Some(2)).await;
        assert!(matches!(outcomes[0], IterationOutcome::Failed(PollError::Transport(_))));
        assert_eq!(outcomes[1], IterationOutcome::Delivered);
        assert_eq!(*h.seen.lock().unwrap(), vec![Cursor(500), Cursor(500)]);

        let texts = h.chat.texts();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].starts_with("Сбой в работе программы: "));
        assert!(texts[0].contains("connection refused"));
        assert_eq!(h.poller.state(), LoopState::Idle);
    }

    #[tokio::test]
    async fn test_missing_field_is_reported() {
        let mut h = harness(vec![Ok(json!({
            "homeworks": [{"status": "approved"}],
            "current_date": 1
        }))]);

        assert_eq!(
            h.poller.run_once().await,
            IterationOutcome::Failed(PollError::MissingField("homework_name"))
        );
        let texts = h.chat.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("homework_name"));
    }

    #[tokio::test]
    async fn test_repeated_failure_reported_once_until_recovery() {
        let shape = || Ok(json!({"current_date": 1}));
        let mut h = harness(vec![
            shape(),
            shape(),
            Ok(json!({"homeworks": [], "current_date": 2})),
            shape(),
        ]);

        h.poller.run_for(Some(4)).await;

        let texts = h.chat.texts();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0], texts[1]);
    }

    #[tokio::test]
    async fn test_delivery_failure_never_escapes() {
        let mut h = harness(vec![
            approved("X", 1000),
            Err(PollError::Service {
                status: 500,
                body: String::new(),
            }),
        ]);
        *h.chat.failing.lock().unwrap() = true;

        let outcomes = h.poller.run_for(Some(2)).await;
        assert!(matches!(outcomes[0], IterationOutcome::Failed(PollError::Delivery(_))));
        assert!(matches!(outcomes[1], IterationOutcome::Failed(PollError::Service { .. })));
        assert!(h.chat.texts().is_empty());
        assert_eq!(h.poller.notifier().delivered_count(), 0);
    }

    #[tokio::test]
    async fn test_same_status_in_new_window_is_delivered() {
        // Rejected, resubmitted and rejected again: two real changes.
        let mut h = harness(vec![approved("X", 1000), approved("X", 1100)]);

        let outcomes = h.poller.run_for(Some(2)).await;
        assert_eq!(
            outcomes,
            vec![IterationOutcome::Delivered, IterationOutcome::Delivered]
        );
        assert_eq!(h.chat.texts().len(), 2);
        assert_eq!(h.poller.cursor(), Cursor(1100));
    }

    #[tokio::test]
    async fn test_replayed_window_not_resent() {
        let replay = || {
            Ok(json!({
                "homeworks": [{"homework_name": "X", "status": "approved"}]
            }))
        };
        let mut h = harness(vec![replay(), replay(), approved("Y", 1200)]);

        let outcomes = h.poller.run_for(Some(3)).await;
        assert_eq!(
            outcomes,
            vec![
                IterationOutcome::Delivered,
                IterationOutcome::Suppressed,
                IterationOutcome::Delivered
            ]
        );
        assert_eq!(h.chat.texts().len(), 2);
        assert_eq!(*h.seen.lock().unwrap(), vec![Cursor(500); 3]);
        assert_eq!(h.poller.cursor(), Cursor(1200));
    }

    #[tokio::test]
    async fn test_zero_iterations_polls_nothing() {
        let mut h = harness(vec![approved("X", 1000)]);

        assert!(h.poller.run_for(Some(0)).await.is_empty());
        assert!(h.seen.lock().unwrap().is_empty());
        assert!(h.chat.texts().is_empty());
    }

    #[test]
    fn test_failure_levels() {
        assert_eq!(failure_level(&PollError::Cursor("absent".into())), Level::WARN);
        assert_eq!(
            failure_level(&PollError::UnknownStatus("on_hold".into())),
            Level::WARN
        );
        assert_eq!(
            failure_level(&PollError::Transport("refused".into())),
            Level::ERROR
        );
        assert_eq!(
            failure_level(&PollError::Delivery("chat not found".into())),
            Level::ERROR
        );
    }

    #[tokio::test]
    async fn test_only_newest_record_is_reported() {
        let mut h = harness(vec![Ok(json!({
            "homeworks": [
                {"homework_name": "new", "status": "rejected"},
                {"homework_name": "old", "status": "approved"}
            ],
            "current_date": 10
        }))]);

        h.poller.run_once().await;
        let texts = h.chat.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("\"new\""));
    }
}
