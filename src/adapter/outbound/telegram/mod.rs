//! Telegram bot integration.
//!
//! [`TelegramTransport`] delivers notifications; [`spawn_update_listener`]
//! long-polls for chat messages and forwards them to the command handler.
//!
//! Requires the `telegram` feature to be enabled.

mod listener;
mod transport;

pub use listener::{register_bot_commands, spawn_update_listener};
pub use transport::TelegramTransport;
