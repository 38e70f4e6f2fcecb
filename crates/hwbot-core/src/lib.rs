//! # HwBot Core
//!
//! Configuration, error types and the channel trait shared by the
//! HwBot crates.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{Credentials, HwBotConfig};
pub use error::{HwBotError, Result};
pub use traits::Channel;
pub use types::OutgoingMessage;
