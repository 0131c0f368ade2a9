mod sqlite;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use taskbell_core::task::{CompleteOutcome, CreateTask, Task, TaskFilter};

pub use sqlite::SqliteDatabase;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Internal(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage backend configuration.
#[derive(Debug, Clone, Default)]
pub struct DbConfig {
    /// SQLite file path. Defaults to `$XDG_DATA_HOME/taskbell/taskbell.db`.
    pub sqlite_path: Option<String>,
}

/// Persistence for tasks.
///
/// Every mutation is one statement applied under the backend's lock, so a
/// completion and a reminder increment on the same task never lose each other.
#[async_trait]
pub trait Database: Send + Sync {
    async fn create_task(&self, input: &CreateTask) -> Result<Task, DbError>;
    async fn get_task(&self, id: i64) -> Result<Task, DbError>;
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, DbError>;

    /// Mark `id` completed at `at` if it belongs to `owner`.
    ///
    /// Returns `DbError::NotFound` when the task does not exist or has a
    /// different owner. An already completed task keeps its `completed_at`.
    async fn complete_task(
        &self,
        id: i64,
        owner: &str,
        at: DateTime<Utc>,
    ) -> Result<CompleteOutcome, DbError>;

    /// Increment `reminder_count` by one and return the updated task.
    async fn record_reminder_sent(&self, id: i64) -> Result<Task, DbError>;
}

pub(crate) fn data_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("taskbell")
}
