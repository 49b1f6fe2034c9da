//! Chat transport port for outbound messages.

use async_trait::async_trait;

use crate::domain::ChatId;
use crate::error::DeliveryError;

/// Sends text messages to chats on a messaging platform.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`); the dispatcher
///   issues sends to several chats concurrently.
/// - A send that never returns is bounded by the caller's timeout, so
///   implementations do not need their own.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `text` to `chat`.
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<(), DeliveryError>;

    /// Get the transport name for logging.
    fn transport_name(&self) -> &'static str;
}
