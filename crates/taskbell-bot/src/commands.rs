//! Chat command parsing and handling.
//!
//! Validation failures become text replies. Only store and render failures
//! surface as [`CommandError`].

use std::sync::Arc;

use chrono_tz::Tz;
use taskbell_core::clock::Clock;
use taskbell_core::error::TimeParseError;
use taskbell_core::task::{CompleteOutcome, CreateTask, TaskFilter};
use taskbell_core::time::{format_local, month_range, parse_local};
use taskbell_db::{Database, DbError};
use taskbell_report::{layout::report_title, render_monthly_report, report_filename, ReportError};
use thiserror::Error;
use tracing::info;

use crate::notify::ChatId;

pub const HELP_TEXT: &str = "Hi 👋 I keep track of your tasks.\n\n\
Commands:\n\
/add <title> | <optional description> | <optional YYYY-MM-DD HH:MM>\n    \
Example: /add Check AC unit | bring spare parts | 2025-09-07 10:00\n\
/list -> list your tasks\n\
/done <id> -> mark a task as done\n\
/report <YYYY> <MM> -> get the month's PDF report of the tasks created in this chat\n";

pub const ADD_USAGE: &str =
    "Usage: /add <title> | <optional description> | <optional YYYY-MM-DD HH:MM>";
pub const DONE_USAGE: &str = "Usage: /done <id>";
pub const REPORT_USAGE: &str = "Usage: /report <YYYY> <MM> (e.g. /report 2025 9)";
pub const INVALID_DATE: &str =
    "Invalid date. Use YYYY-MM-DD HH:MM (e.g. 2025-09-07 10:00) or just YYYY-MM-DD";
pub const EMPTY_TITLE: &str = "The title cannot be empty.";
pub const NO_TASKS: &str = "You have no tasks.";
pub const INVALID_ID: &str = "Invalid id.";
pub const TASK_NOT_FOUND: &str = "Task not found (check the id).";
pub const ALREADY_DONE: &str = "That task was already marked as done.";
pub const INVALID_MONTH: &str = "Invalid year or month.";

/// A recognized chat command with its raw argument text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Add(String),
    List,
    Done(String),
    Report(String),
}

impl Command {
    /// Parse a message text. Returns `None` for plain text and unknown commands.
    ///
    /// Accepts a `@botname` suffix on the command and matches names
    /// case-insensitively.
    pub fn parse(text: &str) -> Option<Command> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;
        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim().to_string()),
            None => (rest, String::new()),
        };
        let name = head.split('@').next().unwrap_or(head).to_lowercase();

        match name.as_str() {
            "start" | "help" => Some(Command::Help),
            "add" => Some(Command::Add(args)),
            "list" | "listar" => Some(Command::List),
            "done" | "hecho" => Some(Command::Done(args)),
            "report" | "reporte" => Some(Command::Report(args)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Document {
        filename: String,
        bytes: Vec<u8>,
        caption: Option<String>,
    },
}

impl Reply {
    fn text(s: impl Into<String>) -> Self {
        Reply::Text(s.into())
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Store(#[from] DbError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Tasks of `owner` created during `year`-`month` (UTC), oldest first.
pub fn report_filter(owner: &str, year: i32, month: u32) -> Result<TaskFilter, TimeParseError> {
    let (from, before) = month_range(year, month)?;
    Ok(TaskFilter {
        owner: Some(owner.to_string()),
        ..TaskFilter::created_between(from, before)
    })
}

pub struct CommandHandler {
    db: Arc<dyn Database>,
    clock: Arc<dyn Clock>,
    zone: Tz,
}

impl CommandHandler {
    pub fn new(db: Arc<dyn Database>, clock: Arc<dyn Clock>, zone: Tz) -> Self {
        Self { db, clock, zone }
    }

    pub async fn handle(&self, chat: ChatId, command: &Command) -> Result<Reply, CommandError> {
        let owner = chat.to_string();
        match command {
            Command::Help => Ok(Reply::text(HELP_TEXT)),
            Command::Add(args) => self.add(&owner, args).await,
            Command::List => self.list(&owner).await,
            Command::Done(args) => self.done(&owner, args).await,
            Command::Report(args) => self.report(&owner, args).await,
        }
    }

    async fn add(&self, owner: &str, args: &str) -> Result<Reply, CommandError> {
        if args.trim().is_empty() {
            return Ok(Reply::text(ADD_USAGE));
        }
        let mut parts = args.split('|').map(str::trim);
        let title = parts.next().unwrap_or_default();
        let description = parts.next().unwrap_or_default();
        let due_text = parts.next().unwrap_or_default();

        if title.is_empty() {
            return Ok(Reply::text(format!("{EMPTY_TITLE}\n{ADD_USAGE}")));
        }
        let due = if due_text.is_empty() {
            None
        } else {
            match parse_local(due_text, self.zone) {
                Ok(due) => Some(due),
                Err(_) => return Ok(Reply::text(INVALID_DATE)),
            }
        };

        let task = self
            .db
            .create_task(&CreateTask {
                owner: owner.to_string(),
                title: title.to_string(),
                description: description.to_string(),
                due,
                created_at: self.clock.now(),
            })
            .await?;
        info!(task_id = task.id, owner, "task created");

        Ok(Reply::text(format!(
            "✅ Task created (id {}): {}\nDue: {}",
            task.id,
            task.title,
            format_local(task.due, self.zone)
        )))
    }

    async fn list(&self, owner: &str) -> Result<Reply, CommandError> {
        let tasks = self.db.list_tasks(&TaskFilter::owned_by(owner)).await?;
        if tasks.is_empty() {
            return Ok(Reply::text(NO_TASKS));
        }
        let lines: Vec<String> = tasks
            .iter()
            .map(|t| {
                let marker = if t.completed { "✅" } else { "⏳" };
                format!(
                    "{}. {marker} {} - {}",
                    t.id,
                    t.title,
                    format_local(t.due, self.zone)
                )
            })
            .collect();
        Ok(Reply::Text(lines.join("\n")))
    }

    async fn done(&self, owner: &str, args: &str) -> Result<Reply, CommandError> {
        let Some(raw_id) = args.split_whitespace().next() else {
            return Ok(Reply::text(DONE_USAGE));
        };
        let Ok(id) = raw_id.parse::<i64>() else {
            return Ok(Reply::text(INVALID_ID));
        };

        match self.db.complete_task(id, owner, self.clock.now()).await {
            Ok(CompleteOutcome::Completed(task)) => {
                info!(task_id = task.id, owner, "task completed");
                Ok(Reply::text(format!(
                    "✅ Marked as done: {}. {}",
                    task.id, task.title
                )))
            }
            Ok(CompleteOutcome::AlreadyCompleted(_)) => Ok(Reply::text(ALREADY_DONE)),
            Err(DbError::NotFound(_)) => Ok(Reply::text(TASK_NOT_FOUND)),
            Err(e) => Err(e.into()),
        }
    }

    async fn report(&self, owner: &str, args: &str) -> Result<Reply, CommandError> {
        let tokens: Vec<&str> = args.split_whitespace().collect();
        if tokens.len() < 2 {
            return Ok(Reply::text(REPORT_USAGE));
        }
        let (Ok(year), Ok(month)) = (tokens[0].parse::<i32>(), tokens[1].parse::<u32>()) else {
            return Ok(Reply::text(INVALID_MONTH));
        };
        let Ok(filter) = report_filter(owner, year, month) else {
            return Ok(Reply::text(INVALID_MONTH));
        };
        let tasks = self.db.list_tasks(&filter).await?;
        let bytes = render_monthly_report(&tasks, year, month, self.clock.now(), self.zone)?;
        info!(owner, year, month, tasks = tasks.len(), "monthly report rendered");

        Ok(Reply::Document {
            filename: report_filename(year, month),
            bytes,
            caption: Some(report_title(year, month)),
        })
    }
}
