use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::reminder_task::ReminderTask;
use crate::domain::repositories::error::Result;

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persist a batch of tasks in one write; returns how many were stored
    async fn insert_tasks(&self, tasks: &[ReminderTask]) -> Result<usize>;

    /// Transition a task to done. Marking an already-done task succeeds again;
    /// an unknown id is `RepositoryError::NotFound`.
    async fn mark_done(&self, task_id: u64) -> Result<()>;

    /// All undone tasks due at or before `before`, earliest first.
    /// There is no lower bound: tasks missed while the process was down are included.
    async fn find_due(&self, before: DateTime<Utc>) -> Result<Vec<ReminderTask>>;

    /// Remove every task of a regimen
    async fn delete_by_regimen(&self, regimen_id: u64) -> Result<usize>;
}
