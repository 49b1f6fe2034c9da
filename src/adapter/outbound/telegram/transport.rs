use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::{ApiError, RequestError};

use crate::domain::ChatId as SubscriberChat;
use crate::error::DeliveryError;
use crate::port::outbound::Transport;

/// [`Transport`] that posts plain-text messages through the Bot API.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    #[must_use]
    pub fn new(bot_token: &str) -> Self {
        Self {
            bot: Bot::new(bot_token),
        }
    }

    /// The underlying bot, shared with the update listener.
    #[must_use]
    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_message(&self, chat: SubscriberChat, text: &str) -> Result<(), DeliveryError> {
        self.bot
            .send_message(ChatId(chat.value()), text)
            .await
            .map(|_| ())
            .map_err(|e| delivery_error(chat, e))
    }

    fn transport_name(&self) -> &'static str {
        "telegram"
    }
}

fn delivery_error(chat: SubscriberChat, error: RequestError) -> DeliveryError {
    match error {
        RequestError::Api(
            ApiError::ChatNotFound
            | ApiError::BotBlocked
            | ApiError::BotKicked
            | ApiError::BotKickedFromSupergroup
            | ApiError::UserDeactivated,
        ) => DeliveryError::InvalidChat(chat.to_string()),
        other => DeliveryError::Transport(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_chat_maps_to_invalid_chat() {
        let chat = SubscriberChat::new(-100);

        assert_eq!(
            delivery_error(chat, RequestError::Api(ApiError::BotBlocked)),
            DeliveryError::InvalidChat("-100".to_string())
        );
        assert!(matches!(
            delivery_error(chat, RequestError::Api(ApiError::MessageTextIsEmpty)),
            DeliveryError::Transport(_)
        ));
    }
}
