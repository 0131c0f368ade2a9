pub mod mock;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Telegram chat identifier.
pub type ChatId = i64;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("http error: {0}")]
    Http(String),

    #[error("telegram api error: {0}")]
    Api(String),

    #[error("send timed out after {0:?}")]
    Timeout(Duration),
}

/// Delivers a text message to a chat.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, chat: ChatId, text: &str) -> Result<(), DeliveryError>;
}
