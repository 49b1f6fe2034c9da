//! Bot commands arriving from chats.
//!
//! Commands mutate the [`ChatRegistry`]. Anything that does not parse as a
//! known command is logged and ignored.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::lifecycle::shutdown_requested;
use super::registry::ChatRegistry;
use crate::port::inbound::InboundCommand;
use crate::port::outbound::Transport;

/// Supported bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Subscribe,
    Unsubscribe,
    Help,
}

/// Parse error for chat command messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    NotACommand,
    UnknownCommand(String),
}

impl std::fmt::Display for CommandParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotACommand => write!(f, "message is not a command"),
            Self::UnknownCommand(cmd) => write!(f, "unknown command `{cmd}`"),
        }
    }
}

impl std::error::Error for CommandParseError {}

/// Parse a chat message into a bot command.
pub fn parse_command(text: &str) -> Result<BotCommand, CommandParseError> {
    let Some(raw_command) = text.split_whitespace().next() else {
        return Err(CommandParseError::NotACommand);
    };
    if !raw_command.starts_with('/') {
        return Err(CommandParseError::NotACommand);
    }

    let command = raw_command
        .split_once('@')
        .map_or(raw_command, |(head, _)| head);

    match command.to_ascii_lowercase().as_str() {
        "/start" | "/subscribe" => Ok(BotCommand::Subscribe),
        "/stop" | "/unsubscribe" => Ok(BotCommand::Unsubscribe),
        "/help" => Ok(BotCommand::Help),
        _ => Err(CommandParseError::UnknownCommand(command.to_string())),
    }
}

/// Help text returned by `/help`.
#[must_use]
pub const fn command_help() -> &'static str {
    "Commands\n\n\
    /start - Subscribe this chat to new and changed listings\n\
    /stop - Unsubscribe this chat\n\
    /help - Show this message"
}

/// Bot commands for menu registration.
///
/// Returns tuples of (command, description).
#[must_use]
pub fn bot_commands() -> Vec<(&'static str, &'static str)> {
    vec![
        ("start", "Subscribe to listing notifications"),
        ("stop", "Unsubscribe from notifications"),
        ("help", "Show all commands"),
    ]
}

/// Applies inbound commands to the registry and acknowledges them.
#[derive(Clone)]
pub struct CommandHandler {
    registry: Arc<ChatRegistry>,
    transport: Arc<dyn Transport>,
    reply_timeout: Duration,
}

impl CommandHandler {
    #[must_use]
    pub fn new(
        registry: Arc<ChatRegistry>,
        transport: Arc<dyn Transport>,
        reply_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            transport,
            reply_timeout,
        }
    }

    /// Apply one command. Returns the reply for the originating chat, or
    /// `None` when the message is ignored.
    pub fn handle(&self, command: &InboundCommand) -> Option<String> {
        let parsed = match parse_command(&command.text) {
            Ok(parsed) => parsed,
            Err(CommandParseError::NotACommand) => {
                debug!(chat = %command.chat, "Ignoring non-command message");
                return None;
            }
            Err(e) => {
                warn!(chat = %command.chat, error = %e, "Ignoring malformed command");
                return None;
            }
        };

        let reply = match parsed {
            BotCommand::Subscribe => match self.registry.subscribe(command.chat) {
                Ok(true) => "Subscribed. New and changed listings will be posted here.",
                Ok(false) => "This chat is already subscribed.",
                Err(e) => {
                    error!(chat = %command.chat, error = %e, "Failed to persist subscription");
                    "Could not save the subscription, please try again later."
                }
            },
            BotCommand::Unsubscribe => match self.registry.unsubscribe(command.chat) {
                Ok(true) => "Unsubscribed. No more notifications will be posted here.",
                Ok(false) => "This chat is not subscribed.",
                Err(e) => {
                    error!(chat = %command.chat, error = %e, "Failed to persist unsubscription");
                    "Could not remove the subscription, please try again later."
                }
            },
            BotCommand::Help => command_help(),
        };

        Some(reply.to_string())
    }

    /// Consume commands until the channel closes or shutdown is requested.
    pub async fn run(
        self,
        mut commands: mpsc::Receiver<InboundCommand>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(transport = self.transport.transport_name(), "Command handler started");

        loop {
            tokio::select! {
                biased;
                () = shutdown_requested(&mut shutdown) => break,
                command = commands.recv() => {
                    let Some(command) = command else {
                        warn!("Command channel closed");
                        break;
                    };
                    // Registry updates write to disk.
                    let handler = self.clone();
                    let handled = tokio::task::spawn_blocking(move || {
                        let reply = handler.handle(&command);
                        (command, reply)
                    })
                    .await;
                    match handled {
                        Ok((command, Some(reply))) => self.reply(&command, &reply).await,
                        Ok((_, None)) => {}
                        Err(e) => error!(error = %e, "Command handling task failed"),
                    }
                }
            }
        }

        info!("Command handler stopped");
    }

    async fn reply(&self, command: &InboundCommand, text: &str) {
        match tokio::time::timeout(
            self.reply_timeout,
            self.transport.send_message(command.chat, text),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(chat = %command.chat, error = %e, "Failed to send command reply"),
            Err(_) => warn!(chat = %command.chat, "Command reply timed out"),
        }
    }
}
