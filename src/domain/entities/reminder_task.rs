use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Undone,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Undone => "undone",
            TaskStatus::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "undone" => Some(TaskStatus::Undone),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

/// A reminder that must fire at `due_at`.
///
/// `regimen_id` is only a lookup key for the message details at send time;
/// the task does not own the regimen and the regimen does not own the task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderTask {
    pub id: u64,
    pub due_at: DateTime<Utc>,
    pub status: TaskStatus,
    pub regimen_id: u64,
}

impl ReminderTask {
    /// New undone task; the id is assigned by the repository
    pub fn undone(regimen_id: u64, due_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            due_at,
            status: TaskStatus::Undone,
            regimen_id,
        }
    }
}
