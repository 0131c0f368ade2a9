use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;
use clap::Parser;
use taskbell_core::time::{parse_zone, DEFAULT_ZONE};
use taskbell_db::DbConfig;
use thiserror::Error;

use crate::notify::ChatId;
use crate::scheduler::{ReminderPolicy, SchedulerConfig};
use crate::telegram::DEFAULT_API_URL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("bot token is required (set TOKEN or pass --token)")]
    MissingToken,

    #[error("unknown time zone: {0}")]
    InvalidTimezone(String),

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

#[derive(Debug, Parser)]
#[command(name = "taskbell", about = "Personal task and reminder bot for Telegram")]
pub struct BotConfig {
    /// Telegram bot token
    #[arg(long, env = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Chat that receives reminders for tasks without a usable owner chat
    #[arg(long, env = "ADMIN_CHAT_ID", allow_hyphen_values = true)]
    pub admin_chat_id: Option<ChatId>,

    /// IANA time zone used to read and display dates
    #[arg(long, env = "TIMEZONE", default_value = DEFAULT_ZONE)]
    pub timezone: String,

    /// Minutes before the due time at which reminders start
    #[arg(long, env = "REMINDER_LEAD_MINUTES", default_value = "0")]
    pub reminder_lead_minutes: u32,

    /// Seconds between reminder scans
    #[arg(long, env = "REMINDER_INTERVAL_SECS", default_value = "60")]
    pub reminder_interval: u64,

    /// Whether a task is reminded on every scan inside its window or only once
    #[arg(long, env = "REMINDER_POLICY", value_enum, default_value_t = ReminderPolicy::RepeatUntilExpired)]
    pub reminder_policy: ReminderPolicy,

    /// Timeout for a single outgoing message (seconds)
    #[arg(long, env = "SEND_TIMEOUT_SECS", default_value = "10")]
    pub send_timeout: u64,

    /// Long-poll timeout for getUpdates (seconds)
    #[arg(long, env = "POLL_TIMEOUT_SECS", default_value = "30")]
    pub poll_timeout: u64,

    /// Path to the SQLite database (defaults to the XDG data dir)
    #[arg(long, env = "TASKBELL_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Bot API base URL
    #[arg(long, env = "TELEGRAM_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

/// Validated runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: String,
    pub api_url: String,
    pub zone: Tz,
    pub scheduler: SchedulerConfig,
    pub poll_timeout_secs: u64,
    pub db: DbConfig,
}

impl BotConfig {
    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        let token = self
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;
        let zone = parse_zone(&self.timezone)
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))?;
        if self.reminder_interval == 0 {
            return Err(ConfigError::ZeroInterval("reminder interval"));
        }
        if self.send_timeout == 0 {
            return Err(ConfigError::ZeroInterval("send timeout"));
        }

        let scheduler = SchedulerConfig {
            zone,
            lead: chrono::Duration::minutes(i64::from(self.reminder_lead_minutes)),
            policy: self.reminder_policy,
            admin_chat: self.admin_chat_id,
            interval: Duration::from_secs(self.reminder_interval),
            send_timeout: Duration::from_secs(self.send_timeout),
        };

        Ok(Settings {
            token,
            api_url: self.api_url,
            zone,
            scheduler,
            poll_timeout_secs: self.poll_timeout,
            db: DbConfig {
                sqlite_path: self.db_path.map(|p| p.to_string_lossy().into_owned()),
            },
        })
    }
}
