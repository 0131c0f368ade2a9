//! Long-poll loop: fetch updates, dispatch commands, send replies.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::commands::{Command, CommandHandler, Reply};
use crate::notify::ChatId;
use crate::telegram::{TelegramClient, TelegramError, Update};

/// Sent when a command fails for reasons the user cannot fix.
pub const GENERIC_FAILURE: &str = "Something went wrong, please try again later.";

const RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Chat and command carried by an update, if it is a text message with a known command.
pub fn command_for(update: &Update) -> Option<(ChatId, Command)> {
    let message = update.message.as_ref()?;
    let command = Command::parse(message.text.as_deref()?)?;
    Some((message.chat.id, command))
}

/// Reply for one update, or `None` when it should be ignored.
///
/// Handler errors are logged and answered with [`GENERIC_FAILURE`].
pub async fn respond(handler: &CommandHandler, update: &Update) -> Option<(ChatId, Reply)> {
    let (chat, command) = command_for(update)?;
    debug!(update_id = update.update_id, chat, ?command, "dispatching command");
    let reply = match handler.handle(chat, &command).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(chat, "command {command:?} failed: {e}");
            Reply::Text(GENERIC_FAILURE.to_string())
        }
    };
    Some((chat, reply))
}

pub struct BotLoop {
    client: Arc<TelegramClient>,
    handler: CommandHandler,
    poll_timeout_secs: u64,
}

impl BotLoop {
    pub fn new(client: Arc<TelegramClient>, handler: CommandHandler, poll_timeout_secs: u64) -> Self {
        Self {
            client,
            handler,
            poll_timeout_secs,
        }
    }

    async fn send_reply(&self, chat: ChatId, reply: Reply) -> Result<(), TelegramError> {
        match reply {
            Reply::Text(text) => self.client.send_message(chat, &text).await,
            Reply::Document {
                filename,
                bytes,
                caption,
            } => {
                self.client
                    .send_document(chat, &filename, bytes, caption.as_deref())
                    .await
            }
        }
    }

    /// Poll until `shutdown` flips to true or its sender drops.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("polling for updates (timeout: {}s)", self.poll_timeout_secs);
        let mut offset: Option<i64> = None;

        loop {
            let polled = tokio::select! {
                polled = self.client.get_updates(offset, self.poll_timeout_secs) => polled,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            };

            let updates = match polled {
                Ok(updates) => updates,
                Err(e) => {
                    warn!("getUpdates failed, retrying in {}s: {e}", RETRY_BACKOFF.as_secs());
                    let stop = tokio::select! {
                        _ = tokio::time::sleep(RETRY_BACKOFF) => false,
                        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
                    };
                    if stop {
                        break;
                    }
                    continue;
                }
            };

            for update in updates {
                offset = Some(update.update_id + 1);
                let Some((chat, reply)) = respond(&self.handler, &update).await else {
                    continue;
                };
                if let Err(e) = self.send_reply(chat, reply).await {
                    warn!(chat, "failed to send reply: {e}");
                }
            }
        }
        info!("update polling stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use taskbell_core::clock::FixedClock;
    use taskbell_db::{Database, SqliteDatabase};

    fn update(id: i64, chat: ChatId, text: Option<&str>) -> Update {
        let raw = serde_json::json!({
            "update_id": id,
            "message": {
                "message_id": id,
                "chat": { "id": chat },
                "text": text,
            }
        });
        serde_json::from_value(raw).unwrap()
    }

    fn handler() -> CommandHandler {
        let db: Arc<dyn Database> = Arc::new(SqliteDatabase::open_in_memory().unwrap());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 9, 5, 12, 0, 0).unwrap(),
        ));
        CommandHandler::new(db, clock, "America/Bogota".parse().unwrap())
    }

    #[test]
    fn extracts_command_and_chat() {
        let (chat, command) = command_for(&update(1, -42, Some("/list"))).unwrap();
        assert_eq!(chat, -42);
        assert_eq!(command, Command::List);
    }

    #[test]
    fn skips_updates_without_commands() {
        assert!(command_for(&update(1, 5, None)).is_none());
        assert!(command_for(&update(2, 5, Some("just chatting"))).is_none());
        let no_message: Update = serde_json::from_str(r#"{"update_id": 3}"#).unwrap();
        assert!(command_for(&no_message).is_none());
    }

    #[tokio::test]
    async fn responds_in_the_originating_chat() {
        let h = handler();
        let (chat, reply) = respond(&h, &update(1, 77, Some("/help"))).await.unwrap();
        assert_eq!(chat, 77);
        assert!(matches!(reply, Reply::Text(ref t) if t.contains("/add")));

        assert!(respond(&h, &update(2, 77, Some("/nope"))).await.is_none());
    }
}
