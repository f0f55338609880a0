use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::entities::reminder_task::ReminderTask;
use crate::domain::repositories::{RepositoryError, TaskRepository};

pub const DEFAULT_LOOKAHEAD_MINUTES: u32 = 10;

/// Finds undone tasks that fall due within the look-ahead window
#[derive(Clone)]
pub struct DueTaskScanner {
    task_repo: Arc<dyn TaskRepository>,
    lookahead: Duration,
}

impl DueTaskScanner {
    pub fn new(task_repo: Arc<dyn TaskRepository>, lookahead: Duration) -> Self {
        Self { task_repo, lookahead }
    }

    pub fn lookahead(&self) -> Duration {
        self.lookahead
    }

    /// Undone tasks due at or before `now + lookahead`, earliest first.
    /// Overdue tasks are included.
    pub async fn scan(&self, now: DateTime<Utc>) -> Result<Vec<ReminderTask>, RepositoryError> {
        let before = now + self.lookahead;
        let due = self.task_repo.find_due(before).await?;

        if due.is_empty() {
            debug!("No reminder tasks due before {}", before);
        } else {
            info!("Found {} reminder task(s) due before {}", due.len(), before);
        }

        Ok(due)
    }
}
