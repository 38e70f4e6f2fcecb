//! # HwBot Channels
//! Chat delivery channel implementations.

pub mod telegram;

pub use telegram::TelegramChannel;
