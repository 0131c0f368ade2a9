use rusqlite::Connection;
use tracing::debug;

use super::SqliteResultExt;
use crate::DbError;

pub(crate) const LATEST_VERSION: i64 = 2;

pub fn run(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )
    .to_db()?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .to_db()?;

    if current_version < 1 {
        // v1: tasks
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tasks (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                owner           TEXT NOT NULL DEFAULT '',
                title           TEXT NOT NULL CHECK(length(title) > 0),
                description     TEXT NOT NULL DEFAULT '',
                due             TEXT,
                created_at      TEXT NOT NULL,
                completed       INTEGER NOT NULL DEFAULT 0 CHECK(completed IN (0, 1)),
                completed_at    TEXT,
                reminder_count  INTEGER NOT NULL DEFAULT 0 CHECK(reminder_count >= 0),
                CHECK((completed = 0) = (completed_at IS NULL))
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_owner   ON tasks(owner);
            CREATE INDEX IF NOT EXISTS idx_tasks_created ON tasks(created_at);",
        )
        .to_db()?;
        mark_applied(conn, 1)?;
    }

    if current_version < 2 {
        // v2: reminder scans only touch open, dated tasks
        conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_tasks_open_due
                ON tasks(completed, due) WHERE due IS NOT NULL;",
        )
        .to_db()?;
        mark_applied(conn, 2)?;
    }

    Ok(())
}

fn mark_applied(conn: &Connection, version: i64) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        [version],
    )
    .to_db()?;
    debug!("applied schema migration v{version}");
    Ok(())
}
