use std::cmp::Ordering;
use tokio::time::Instant;

use crate::domain::entities::reminder_task::ReminderTask;

/// A task claimed for delivery, waiting in the dispatch queue until `deadline`
#[derive(Debug, Clone)]
pub struct PendingReminder {
    pub task: ReminderTask,
    pub deadline: Instant,
    pub sequence: u64, // enqueue order, breaks ties between equal deadlines
}

// earliest deadline first, then enqueue order
impl Ord for PendingReminder {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .cmp(&other.deadline)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for PendingReminder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PendingReminder {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.sequence == other.sequence
    }
}

impl Eq for PendingReminder {}
