use async_trait::async_trait;
use rusqlite::{Row, params};
use chrono::{DateTime, Utc};

use crate::domain::entities::reminder_task::{ReminderTask, TaskStatus};
use crate::domain::repositories::TaskRepository;
use crate::domain::repositories::error::{RepositoryError, Result};
use crate::infrastructure::database::DatabaseManager;
use crate::infrastructure::repositories::row_mapping::{invalid_column, utc_from_timestamp};

/// Reminder tasks in the `tasks` table; `due_at` is stored as unix seconds
#[derive(Clone)]
pub struct SqliteTaskRepository {
    db: DatabaseManager,
}

impl SqliteTaskRepository {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    fn row_to_task(row: &Row) -> rusqlite::Result<ReminderTask> {
        let id: i64 = row.get(0)?;
        let regimen_id: i64 = row.get(1)?;
        let due_ts: i64 = row.get(2)?;
        let status: String = row.get(3)?;

        Ok(ReminderTask {
            id: id as u64,
            regimen_id: regimen_id as u64,
            due_at: utc_from_timestamp(2, due_ts)?,
            status: TaskStatus::parse(&status)
                .ok_or_else(|| invalid_column(3, format!("unknown task status '{}'", status)))?,
        })
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn insert_tasks(&self, tasks: &[ReminderTask]) -> Result<usize> {
        if tasks.is_empty() {
            return Ok(0);
        }
        let tasks = tasks.to_vec();

        let inserted = self
            .db
            .execute_blocking(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare("INSERT INTO tasks (regimen_id, due_at, status) VALUES (?1, ?2, ?3)")?;
                    for task in &tasks {
                        stmt.execute(params![task.regimen_id as i64, task.due_at.timestamp(), task.status.as_str()])?;
                    }
                }
                tx.commit()?;
                Ok(tasks.len())
            })
            .await?;

        Ok(inserted)
    }

    async fn mark_done(&self, task_id: u64) -> Result<()> {
        let affected = self
            .db
            .execute_blocking(move |conn| {
                conn.execute(
                    "UPDATE tasks SET status = ?1 WHERE id = ?2",
                    params![TaskStatus::Done.as_str(), task_id as i64],
                )
            })
            .await?;

        // sqlite counts matched rows, so an already-done task still reports 1
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn find_due(&self, before: DateTime<Utc>) -> Result<Vec<ReminderTask>> {
        let tasks = self
            .db
            .execute_blocking(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, regimen_id, due_at, status FROM tasks
                     WHERE status = ?1 AND due_at <= ?2
                     ORDER BY due_at ASC, id ASC",
                )?;
                stmt.query_map(params![TaskStatus::Undone.as_str(), before.timestamp()], Self::row_to_task)?
                    .collect::<rusqlite::Result<Vec<_>>>()
            })
            .await?;

        Ok(tasks)
    }

    async fn delete_by_regimen(&self, regimen_id: u64) -> Result<usize> {
        let removed = self
            .db
            .execute_blocking(move |conn| conn.execute("DELETE FROM tasks WHERE regimen_id = ?1", params![regimen_id as i64]))
            .await?;

        Ok(removed)
    }
}
