//! # HwBot Poller
//!
//! The polling/notification control loop.
//!
//! ## Architecture
//! ```text
//! PollLoop (fixed sleep between iterations)
//!   ├── StatusFetcher     GET endpoint?from_date=<cursor>
//!   ├── validate          homeworks + current_date
//!   ├── StatusInterpreter newest record → message
//!   └── Notifier          → Channel (Telegram)
//!
//! Failures → PollError → FailurePolicy
//!   ├── Report → log + notify operator (once per distinct failure)
//!   └── Silent → log only
//! ```

pub mod engine;
pub mod error;
pub mod fetcher;
pub mod interpret;
pub mod notify;
pub mod record;
pub mod validate;

pub use engine::{IterationOutcome, LoopConfig, LoopState, PollLoop};
pub use error::{FailurePolicy, PollError};
pub use fetcher::{HttpStatusFetcher, StatusFetcher};
pub use interpret::{StatusInterpreter, VerdictTable};
pub use notify::{DeliveredNotification, Notifier};
pub use record::{Cursor, StatusRecord};
pub use validate::{Validated, validate};
