// Backend-agnostic integration tests for the Database trait.
//
// Each public async function accepts `&dyn Database` so the same assertions
// can run against any backend.

use chrono::{DateTime, TimeZone, Utc};
use taskbell_core::task::{CompleteOutcome, CreateTask, TaskFilter};
use taskbell_db::{Database, DbError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn make_task(owner: &str, title: &str, due: Option<DateTime<Utc>>) -> CreateTask {
    CreateTask {
        owner: owner.to_string(),
        title: title.to_string(),
        description: String::new(),
        due,
        created_at: at(2025, 9, 1, 12, 0),
    }
}

// ---------------------------------------------------------------------------
// Task tests
// ---------------------------------------------------------------------------

/// Create then read back; ids are assigned in increasing order.
pub async fn test_task_crud(db: &dyn Database) {
    let first = db
        .create_task(&CreateTask {
            owner: "100".into(),
            title: "Check AC unit".into(),
            description: "bring spare parts".into(),
            due: Some(at(2025, 9, 7, 15, 0)),
            created_at: at(2025, 9, 1, 12, 0),
        })
        .await
        .unwrap();
    assert_eq!(first.owner, "100");
    assert_eq!(first.title, "Check AC unit");
    assert_eq!(first.description, "bring spare parts");
    assert_eq!(first.due, Some(at(2025, 9, 7, 15, 0)));
    assert_eq!(first.created_at, at(2025, 9, 1, 12, 0));
    assert!(!first.completed);
    assert!(first.completed_at.is_none());
    assert_eq!(first.reminder_count, 0);

    let second = db.create_task(&make_task("100", "Second", None)).await.unwrap();
    assert!(second.id > first.id);
    assert!(second.due.is_none());

    let fetched = db.get_task(first.id).await.unwrap();
    assert_eq!(fetched, first);
}

pub async fn test_get_missing_task(db: &dyn Database) {
    let err = db.get_task(9999).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)));
}

pub async fn test_empty_title_rejected(db: &dyn Database) {
    let result = db.create_task(&make_task("100", "", None)).await;
    assert!(result.is_err());
}

/// Owner filter and nulls-last due ordering for listings.
pub async fn test_list_by_owner_nulls_last(db: &dyn Database) {
    let undated = db.create_task(&make_task("1", "undated", None)).await.unwrap();
    let late = db
        .create_task(&make_task("1", "late", Some(at(2025, 9, 20, 10, 0))))
        .await
        .unwrap();
    let early = db
        .create_task(&make_task("1", "early", Some(at(2025, 9, 5, 10, 0))))
        .await
        .unwrap();
    db.create_task(&make_task("2", "someone else", Some(at(2025, 9, 1, 10, 0))))
        .await
        .unwrap();

    let tasks = db.list_tasks(&TaskFilter::owned_by("1")).await.unwrap();
    let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![early.id, late.id, undated.id]);
}

/// Only open tasks with a due date are reminder candidates.
pub async fn test_reminder_candidates(db: &dyn Database) {
    let dated = db
        .create_task(&make_task("1", "dated", Some(at(2025, 9, 7, 15, 0))))
        .await
        .unwrap();
    db.create_task(&make_task("1", "undated", None)).await.unwrap();
    let done = db
        .create_task(&make_task("1", "done", Some(at(2025, 9, 7, 15, 0))))
        .await
        .unwrap();
    db.complete_task(done.id, "1", at(2025, 9, 2, 0, 0)).await.unwrap();

    let candidates = db
        .list_tasks(&TaskFilter::reminder_candidates())
        .await
        .unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, dated.id);
}

/// Creation-range filter is half-open and ordered by creation time.
pub async fn test_created_range(db: &dyn Database) {
    let stamps = [
        ("august", at(2025, 8, 31, 23, 59)),
        ("late sept", at(2025, 9, 30, 23, 0)),
        ("first", at(2025, 9, 1, 0, 0)),
        ("october", at(2025, 10, 1, 0, 0)),
        ("mid", at(2025, 9, 15, 8, 30)),
    ];
    for (title, created_at) in stamps {
        db.create_task(&CreateTask {
            created_at,
            ..make_task("1", title, None)
        })
        .await
        .unwrap();
    }

    let tasks = db
        .list_tasks(&TaskFilter::created_between(
            at(2025, 9, 1, 0, 0),
            at(2025, 10, 1, 0, 0),
        ))
        .await
        .unwrap();
    let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "mid", "late sept"]);
}

pub async fn test_limit(db: &dyn Database) {
    for i in 0..5 {
        db.create_task(&make_task("1", &format!("t{i}"), None))
            .await
            .unwrap();
    }
    let tasks = db
        .list_tasks(&TaskFilter {
            limit: Some(2),
            ..TaskFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(tasks.len(), 2);
}

/// Completion is set once; a second attempt leaves `completed_at` alone.
pub async fn test_complete_once(db: &dyn Database) {
    let task = db.create_task(&make_task("1", "finish me", None)).await.unwrap();

    let first = db.complete_task(task.id, "1", at(2025, 9, 2, 10, 0)).await.unwrap();
    match &first {
        CompleteOutcome::Completed(t) => {
            assert!(t.completed);
            assert_eq!(t.completed_at, Some(at(2025, 9, 2, 10, 0)));
        }
        other => panic!("expected Completed, got {other:?}"),
    }

    let second = db.complete_task(task.id, "1", at(2025, 9, 3, 10, 0)).await.unwrap();
    match &second {
        CompleteOutcome::AlreadyCompleted(t) => {
            assert_eq!(t.completed_at, Some(at(2025, 9, 2, 10, 0)));
        }
        other => panic!("expected AlreadyCompleted, got {other:?}"),
    }
}

pub async fn test_complete_requires_owner(db: &dyn Database) {
    let task = db.create_task(&make_task("1", "mine", None)).await.unwrap();

    let err = db
        .complete_task(task.id, "2", at(2025, 9, 2, 10, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)));

    let err = db
        .complete_task(task.id + 100, "1", at(2025, 9, 2, 10, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)));

    let untouched = db.get_task(task.id).await.unwrap();
    assert!(!untouched.completed);
}

/// Reminder counter only moves up, one step per call.
pub async fn test_reminder_counter(db: &dyn Database) {
    let task = db
        .create_task(&make_task("1", "nag", Some(at(2025, 9, 7, 15, 0))))
        .await
        .unwrap();

    for expected in 1..=3 {
        let updated = db.record_reminder_sent(task.id).await.unwrap();
        assert_eq!(updated.reminder_count, expected);
    }

    let err = db.record_reminder_sent(task.id + 100).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)));
}

/// Completion racing many reminder increments never drops a write.
pub async fn test_concurrent_updates(db: std::sync::Arc<dyn Database>) {
    let task = db
        .create_task(&make_task("1", "busy", Some(at(2025, 9, 7, 15, 0))))
        .await
        .unwrap();
    let id = task.id;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            db.record_reminder_sent(id).await.unwrap();
        }));
    }
    let completer = {
        let db = db.clone();
        tokio::spawn(async move {
            db.complete_task(id, "1", at(2025, 9, 7, 15, 30))
                .await
                .unwrap();
        })
    };
    for h in handles {
        h.await.unwrap();
    }
    completer.await.unwrap();

    let final_state = db.get_task(id).await.unwrap();
    assert_eq!(final_state.reminder_count, 20);
    assert!(final_state.completed);
    assert!(final_state.completed_at.is_some());
}
