use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{ChatId, DeliveryError, NotificationSink};

/// A sink for testing that records every message it accepts.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(ChatId, String)>>,
    /// Chats whose sends fail with an API error.
    failing: HashSet<ChatId>,
    /// Artificial latency applied before each send.
    delay: Option<Duration>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, chat: ChatId) -> Self {
        self.failing.insert(chat);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, chat: ChatId, text: &str) -> Result<(), DeliveryError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(&chat) {
            return Err(DeliveryError::Api(format!("Bad Request: chat {chat} not found")));
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((chat, text.to_string()));
        Ok(())
    }
}
