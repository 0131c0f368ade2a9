use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use taskbell_core::task::{CompleteOutcome, CreateTask, Task, TaskFilter};

use super::super::{SqliteDatabase, SqliteResultExt};
use crate::DbError;

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        owner: row.get("owner")?,
        title: row.get("title")?,
        description: row.get("description")?,
        due: row.get("due")?,
        created_at: row.get("created_at")?,
        completed: row.get("completed")?,
        completed_at: row.get("completed_at")?,
        reminder_count: row.get("reminder_count")?,
    })
}

fn fetch_task(conn: &Connection, id: i64) -> Result<Task, DbError> {
    conn.query_row("SELECT * FROM tasks WHERE id = ?1", params![id], row_to_task)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("task {id}")),
            other => DbError::Internal(other.to_string()),
        })
}

impl SqliteDatabase {
    pub fn create_task_sync(&self, input: &CreateTask) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (owner, title, description, due, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    input.owner,
                    input.title,
                    input.description,
                    input.due,
                    input.created_at,
                ],
            )
            .to_db()?;
            fetch_task(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_task_sync(&self, id: i64) -> Result<Task, DbError> {
        self.with_conn(|conn| fetch_task(conn, id))
    }

    pub fn list_tasks_sync(&self, filter: &TaskFilter) -> Result<Vec<Task>, DbError> {
        self.with_conn(|conn| {
            let mut sql = String::from("SELECT * FROM tasks WHERE 1=1");
            let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

            if let Some(ref owner) = filter.owner {
                param_values.push(Box::new(owner.clone()));
                sql.push_str(&format!(" AND owner = ?{}", param_values.len()));
            }
            if let Some(completed) = filter.completed {
                param_values.push(Box::new(completed));
                sql.push_str(&format!(" AND completed = ?{}", param_values.len()));
            }
            match filter.has_due {
                Some(true) => sql.push_str(" AND due IS NOT NULL"),
                Some(false) => sql.push_str(" AND due IS NULL"),
                None => {}
            }
            if let Some(from) = filter.created_from {
                param_values.push(Box::new(from));
                sql.push_str(&format!(" AND created_at >= ?{}", param_values.len()));
            }
            if let Some(before) = filter.created_before {
                param_values.push(Box::new(before));
                sql.push_str(&format!(" AND created_at < ?{}", param_values.len()));
            }

            sql.push_str(" ORDER BY ");
            sql.push_str(filter.order.as_sql());

            if let Some(limit) = filter.limit {
                param_values.push(Box::new(limit));
                sql.push_str(&format!(" LIMIT ?{}", param_values.len()));
            }

            let params_ref: Vec<&dyn rusqlite::types::ToSql> =
                param_values.iter().map(|p| p.as_ref()).collect();

            let mut stmt = conn.prepare(&sql).to_db()?;
            let tasks = stmt
                .query_map(params_ref.as_slice(), row_to_task)
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            Ok(tasks)
        })
    }

    pub fn complete_task_sync(
        &self,
        id: i64,
        owner: &str,
        at: DateTime<Utc>,
    ) -> Result<CompleteOutcome, DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE tasks SET completed = 1, completed_at = ?3
                     WHERE id = ?1 AND owner = ?2 AND completed = 0",
                    params![id, owner, at],
                )
                .to_db()?;

            let task = fetch_task(conn, id)?;
            if task.owner != owner {
                return Err(DbError::NotFound(format!("task {id}")));
            }
            if changed == 1 {
                Ok(CompleteOutcome::Completed(task))
            } else {
                Ok(CompleteOutcome::AlreadyCompleted(task))
            }
        })
    }

    pub fn record_reminder_sent_sync(&self, id: i64) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE tasks SET reminder_count = reminder_count + 1 WHERE id = ?1",
                    params![id],
                )
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("task {id}")));
            }
            fetch_task(conn, id)
        })
    }
}
