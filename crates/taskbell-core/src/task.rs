use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A dated task owned by the chat that created it.
///
/// Every instant is stored in UTC. `completed_at` is set if and only if
/// `completed` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    /// Chat id of the creator, as decimal text. Empty when unknown.
    pub owner: String,
    pub title: String,
    pub description: String,
    pub due: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub reminder_count: i64,
}

impl Task {
    /// Destination chat for reminders, if the owner is a usable (non-zero) chat id.
    pub fn owner_chat(&self) -> Option<i64> {
        let owner = self.owner.trim();
        if owner.is_empty() {
            return None;
        }
        owner.parse().ok().filter(|&chat: &i64| chat != 0)
    }

    /// Whether the task is still open and past its due instant.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due.is_some_and(|due| due < now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub owner: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOrder {
    /// Earliest due first, tasks without a due date last.
    #[default]
    DueAscNullsLast,
    /// Oldest first by creation time.
    CreatedAsc,
}

impl TaskOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            TaskOrder::DueAscNullsLast => "due IS NULL, due ASC, id ASC",
            TaskOrder::CreatedAsc => "created_at ASC, id ASC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub owner: Option<String>,
    pub completed: Option<bool>,
    /// `Some(true)` keeps only tasks with a due date, `Some(false)` only those without.
    pub has_due: Option<bool>,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub created_before: Option<DateTime<Utc>>,
    pub order: TaskOrder,
    pub limit: Option<i64>,
}

impl TaskFilter {
    /// Open tasks that carry a due date, the reminder candidates.
    pub fn reminder_candidates() -> Self {
        Self {
            completed: Some(false),
            has_due: Some(true),
            ..Self::default()
        }
    }

    /// Every task of one owner, nulls-last by due date.
    pub fn owned_by(owner: &str) -> Self {
        Self {
            owner: Some(owner.to_string()),
            ..Self::default()
        }
    }

    /// Tasks created inside `[from, before)`, oldest first.
    pub fn created_between(from: DateTime<Utc>, before: DateTime<Utc>) -> Self {
        Self {
            created_from: Some(from),
            created_before: Some(before),
            order: TaskOrder::CreatedAsc,
            ..Self::default()
        }
    }
}

/// Result of asking the store to complete a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompleteOutcome {
    /// The task went from open to completed by this call.
    Completed(Task),
    /// The task was already completed; nothing changed.
    AlreadyCompleted(Task),
}

impl CompleteOutcome {
    pub fn task(&self) -> &Task {
        match self {
            CompleteOutcome::Completed(t) | CompleteOutcome::AlreadyCompleted(t) => t,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(owner: &str) -> Task {
        Task {
            id: 7,
            owner: owner.to_string(),
            title: "Check the AC unit".into(),
            description: String::new(),
            due: Some(Utc.with_ymd_and_hms(2025, 9, 7, 15, 0, 0).unwrap()),
            created_at: Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap(),
            completed: false,
            completed_at: None,
            reminder_count: 0,
        }
    }

    #[test]
    fn owner_chat_parses_numeric_ids() {
        assert_eq!(sample("12345").owner_chat(), Some(12345));
        assert_eq!(sample("-100200").owner_chat(), Some(-100200));
    }

    #[test]
    fn owner_chat_rejects_blank_and_garbage() {
        assert_eq!(sample("").owner_chat(), None);
        assert_eq!(sample("   ").owner_chat(), None);
        assert_eq!(sample("alice").owner_chat(), None);
        assert_eq!(sample("0").owner_chat(), None);
    }

    #[test]
    fn overdue_only_when_open_and_past_due() {
        let task = sample("1");
        let before = Utc.with_ymd_and_hms(2025, 9, 7, 14, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 9, 7, 16, 0, 0).unwrap();
        assert!(!task.is_overdue(before));
        assert!(task.is_overdue(after));

        let mut done = sample("1");
        done.completed = true;
        done.completed_at = Some(after);
        assert!(!done.is_overdue(after));

        let mut undated = sample("1");
        undated.due = None;
        assert!(!undated.is_overdue(after));
    }

    #[test]
    fn filter_presets() {
        let f = TaskFilter::reminder_candidates();
        assert_eq!(f.completed, Some(false));
        assert_eq!(f.has_due, Some(true));
        assert!(f.owner.is_none());

        let f = TaskFilter::owned_by("42");
        assert_eq!(f.owner.as_deref(), Some("42"));
        assert_eq!(f.order, TaskOrder::DueAscNullsLast);

        let from = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap();
        let f = TaskFilter::created_between(from, before);
        assert_eq!(f.order, TaskOrder::CreatedAsc);
        assert_eq!(f.created_from, Some(from));
        assert_eq!(f.created_before, Some(before));
    }

    #[test]
    fn task_serializes_with_snake_case_fields() {
        let json = serde_json::to_value(sample("1")).unwrap();
        assert_eq!(json["reminder_count"], 0);
        assert_eq!(json["completed"], false);
        assert!(json["completed_at"].is_null());
    }
}
