use std::fmt;

use chrono::{DateTime, Utc};
use taskbell_core::task::Task;

/// Per-task status shown in the monthly report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    Done,
    Late,
    Pending,
}

impl ReportStatus {
    pub fn derive(task: &Task, now: DateTime<Utc>) -> Self {
        if task.completed {
            ReportStatus::Done
        } else if task.is_overdue(now) {
            ReportStatus::Late
        } else {
            ReportStatus::Pending
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ReportStatus::Done => "Done",
            ReportStatus::Late => "Late",
            ReportStatus::Pending => "Pending",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task(due: Option<DateTime<Utc>>, completed: bool) -> Task {
        Task {
            id: 1,
            owner: "1".into(),
            title: "t".into(),
            description: String::new(),
            due,
            created_at: Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap(),
            completed,
            completed_at: completed.then(|| Utc.with_ymd_and_hms(2025, 9, 2, 0, 0, 0).unwrap()),
            reminder_count: 0,
        }
    }

    #[test]
    fn completed_wins_over_late() {
        let past = Utc.with_ymd_and_hms(2025, 9, 3, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 9, 10, 0, 0, 0).unwrap();
        assert_eq!(ReportStatus::derive(&task(Some(past), true), now), ReportStatus::Done);
    }

    #[test]
    fn open_past_due_is_late() {
        let past = Utc.with_ymd_and_hms(2025, 9, 3, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 9, 10, 0, 0, 0).unwrap();
        assert_eq!(ReportStatus::derive(&task(Some(past), false), now), ReportStatus::Late);
    }

    #[test]
    fn open_future_or_undated_is_pending() {
        let future = Utc.with_ymd_and_hms(2025, 9, 20, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 9, 10, 0, 0, 0).unwrap();
        assert_eq!(ReportStatus::derive(&task(Some(future), false), now), ReportStatus::Pending);
        assert_eq!(ReportStatus::derive(&task(None, false), now), ReportStatus::Pending);
        assert_eq!(ReportStatus::Pending.to_string(), "Pending");
    }
}
