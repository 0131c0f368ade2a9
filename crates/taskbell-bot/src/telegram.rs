//! Minimal Telegram Bot API client over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::notify::{ChatId, DeliveryError, NotificationSink};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Extra time on top of the long-poll timeout before the HTTP request gives up.
const POLL_SLACK_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("telegram api error: {0}")]
    Api(String),
}

impl From<TelegramError> for DeliveryError {
    fn from(e: TelegramError) -> Self {
        match e {
            TelegramError::Http(e) => DeliveryError::Http(e.to_string()),
            TelegramError::Api(msg) => DeliveryError::Api(msg),
        }
    }
}

/// Every Bot API response is wrapped in this envelope.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self) -> Result<T, TelegramError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(TelegramError::Api("response missing result".into())),
            (false, _) => Err(TelegramError::Api(
                self.description
                    .unwrap_or_else(|| "request failed without description".into()),
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

pub struct TelegramClient {
    base_url: String,
    client: Client,
    request_timeout: Duration,
}

impl TelegramClient {
    /// `request_timeout` bounds every call except the long poll, which uses
    /// its own timeout plus some slack.
    pub fn new(api_url: &str, token: &str, request_timeout: Duration) -> Self {
        let api_url = api_url.trim_end_matches('/');
        Self {
            base_url: format!("{api_url}/bot{token}"),
            client: Client::new(),
            request_timeout,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, TelegramError> {
        // Telegram returns the envelope on errors too, with a non-2xx status.
        let body: ApiResponse<T> = resp.json().await?;
        body.into_result()
    }

    /// Long-poll for updates starting at `offset`.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let mut body = json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        let resp = self
            .client
            .post(self.method_url("getUpdates"))
            .timeout(Duration::from_secs(timeout_secs + POLL_SLACK_SECS))
            .json(&body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Send plain text, no parse mode.
    pub async fn send_message(&self, chat: ChatId, text: &str) -> Result<(), TelegramError> {
        let resp = self
            .client
            .post(self.method_url("sendMessage"))
            .timeout(self.request_timeout)
            .json(&json!({ "chat_id": chat, "text": text }))
            .send()
            .await?;
        Self::decode::<serde_json::Value>(resp).await.map(|_| ())
    }

    pub async fn send_document(
        &self,
        chat: ChatId,
        filename: &str,
        bytes: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<(), TelegramError> {
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("application/pdf")?;
        let mut form = Form::new()
            .text("chat_id", chat.to_string())
            .part("document", part);
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }
        let resp = self
            .client
            .post(self.method_url("sendDocument"))
            .timeout(self.request_timeout)
            .multipart(form)
            .send()
            .await?;
        Self::decode::<serde_json::Value>(resp).await.map(|_| ())
    }
}

#[async_trait]
impl NotificationSink for TelegramClient {
    async fn send(&self, chat: ChatId, text: &str) -> Result<(), DeliveryError> {
        self.send_message(chat, text).await.map_err(DeliveryError::from)
    }
}
