//! Inbound ports (driving side): what chats send to the bot.

use crate::domain::ChatId;

/// A raw text message received from a chat.
///
/// Transports deliver these over a channel; parsing into a bot command
/// happens in the application layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCommand {
    pub chat: ChatId,
    pub text: String,
}

impl InboundCommand {
    pub fn new(chat: impl Into<ChatId>, text: impl Into<String>) -> Self {
        Self {
            chat: chat.into(),
            text: text.into(),
        }
    }
}
