//! Transport that writes notifications to the log instead of a chat.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ChatId;
use crate::error::DeliveryError;
use crate::port::outbound::Transport;

/// Logs every message. Used when no messaging platform is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl Transport for LogTransport {
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<(), DeliveryError> {
        info!(chat = %chat, text = %text, "Notification");
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_transport_always_succeeds() {
        let transport = LogTransport;
        assert!(transport
            .send_message(ChatId::new(1), "New listing: A")
            .await
            .is_ok());
        assert_eq!(transport.transport_name(), "log");
    }
}
