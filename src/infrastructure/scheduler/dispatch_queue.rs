use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tokio::time::Instant;

use crate::domain::entities::pending_reminder::PendingReminder;

/// Planned reminders waiting for their deadline, earliest first
#[derive(Debug, Default)]
pub struct DispatchQueue {
    // reverse so that BinaryHeap (max-heap) behaves as a min-heap
    reminders: BinaryHeap<Reverse<PendingReminder>>,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, reminders: impl IntoIterator<Item = PendingReminder>) {
        self.reminders.extend(reminders.into_iter().map(Reverse));
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.reminders.peek().map(|reverse| reverse.0.deadline)
    }

    /// Removes every reminder whose deadline is at or before `now`, in (deadline, sequence) order
    pub fn pop_ready(&mut self, now: Instant) -> Vec<PendingReminder> {
        let mut ready = Vec::new();
        while self.next_deadline().is_some_and(|deadline| deadline <= now) {
            if let Some(Reverse(reminder)) = self.reminders.pop() {
                ready.push(reminder);
            }
        }
        ready
    }

    /// Empties the queue, earliest first
    pub fn drain(&mut self) -> Vec<PendingReminder> {
        let mut remaining = Vec::with_capacity(self.reminders.len());
        while let Some(Reverse(reminder)) = self.reminders.pop() {
            remaining.push(reminder);
        }
        remaining
    }

    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::reminder_task::ReminderTask;
    use chrono::Utc;
    use std::time::Duration;

    fn reminder(task_id: u64, deadline: Instant, sequence: u64) -> PendingReminder {
        let mut task = ReminderTask::undone(1, Utc::now());
        task.id = task_id;
        PendingReminder { task, deadline, sequence }
    }

    #[test]
    fn pops_only_ready_reminders_in_order() {
        let start = Instant::now();
        let mut queue = DispatchQueue::new();
        queue.extend([
            reminder(3, start + Duration::from_secs(300), 2),
            reminder(1, start + Duration::from_secs(60), 0),
            reminder(4, start + Duration::from_secs(900), 3),
            reminder(2, start + Duration::from_secs(300), 1),
        ]);

        assert_eq!(queue.next_deadline(), Some(start + Duration::from_secs(60)));

        let ready = queue.pop_ready(start + Duration::from_secs(300));
        let ids: Vec<u64> = ready.iter().map(|r| r.task.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_deadline(), Some(start + Duration::from_secs(900)));
    }

    #[test]
    fn nothing_is_ready_before_the_first_deadline() {
        let start = Instant::now();
        let mut queue = DispatchQueue::new();
        queue.extend([reminder(1, start + Duration::from_secs(60), 0)]);

        assert!(queue.pop_ready(start).is_empty());
        assert!(!queue.is_empty());
    }

    #[test]
    fn drain_empties_the_queue_in_order() {
        let start = Instant::now();
        let mut queue = DispatchQueue::new();
        queue.extend([
            reminder(2, start + Duration::from_secs(120), 1),
            reminder(1, start + Duration::from_secs(60), 0),
        ]);

        let drained: Vec<u64> = queue.drain().iter().map(|r| r.task.id).collect();

        assert_eq!(drained, vec![1, 2]);
        assert!(queue.is_empty());
        assert_eq!(queue.next_deadline(), None);
    }
}
