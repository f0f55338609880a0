use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::application::services::notification_service::NotificationService;
use crate::domain::entities::pending_reminder::PendingReminder;
use crate::domain::entities::reminder_task::ReminderTask;
use crate::domain::repositories::{RegimenDetailsLookup, TaskRepository};

/// How one reminder's unit of work ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    DetailsUnavailable,
    SendFailed,
    MarkFailed,
}

type InFlight = Arc<StdMutex<HashSet<u64>>>;

fn lock_in_flight(in_flight: &InFlight) -> MutexGuard<'_, HashSet<u64>> {
    in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Releases a task's in-flight claim when the unit of work ends, however it ends
struct Claim {
    in_flight: InFlight,
    task_id: u64,
}

impl Drop for Claim {
    fn drop(&mut self) {
        lock_in_flight(&self.in_flight).remove(&self.task_id);
    }
}

/// Turns a scanned batch into fire deadlines and delivers each reminder
/// in its own spawned task.
pub struct ReminderDispatcher {
    task_repo: Arc<dyn TaskRepository>,
    details: Arc<dyn RegimenDetailsLookup>,
    notifications: NotificationService,
    in_flight: InFlight,
    next_sequence: AtomicU64,
}

impl ReminderDispatcher {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        details: Arc<dyn RegimenDetailsLookup>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            task_repo,
            details,
            notifications,
            in_flight: Arc::new(StdMutex::new(HashSet::new())),
            next_sequence: AtomicU64::new(0),
        }
    }

    /// Claims every task of `batch` that is not already in flight and gives it a
    /// deadline on the monotonic clock. The first task of the batch fires at
    /// `clock + max(0, due₀ - now)`; each later task keeps its offset from the first.
    pub fn plan(&self, batch: Vec<ReminderTask>, now: DateTime<Utc>, clock: Instant) -> Vec<PendingReminder> {
        let Some(first) = batch.first() else {
            return Vec::new();
        };

        let anchor_due = first.due_at;
        let anchor = clock + (anchor_due - now).to_std().unwrap_or(Duration::ZERO);

        let mut in_flight = lock_in_flight(&self.in_flight);
        let mut planned = Vec::with_capacity(batch.len());

        for task in batch {
            if !in_flight.insert(task.id) {
                debug!("Task #{} already in flight, skipping", task.id);
                continue;
            }

            let offset = (task.due_at - anchor_due).to_std().unwrap_or(Duration::ZERO);
            planned.push(PendingReminder {
                deadline: anchor + offset,
                sequence: self.next_sequence.fetch_add(1, Ordering::Relaxed),
                task,
            });
        }

        planned
    }

    /// Spawns the delivery of one planned reminder. A failure affects only this
    /// task; its claim is released when the work ends.
    pub fn fire(&self, reminder: PendingReminder) -> JoinHandle<DispatchOutcome> {
        let claim = Claim {
            in_flight: self.in_flight.clone(),
            task_id: reminder.task.id,
        };
        let task_repo = self.task_repo.clone();
        let details = self.details.clone();
        let notifications = self.notifications.clone();

        tokio::spawn(async move {
            let _claim = claim;
            deliver(reminder.task, task_repo, details, notifications).await
        })
    }

    /// Drops the claims of planned reminders that will never be fired,
    /// so the next scan can plan them again
    pub fn release(&self, reminders: impl IntoIterator<Item = PendingReminder>) -> usize {
        let mut in_flight = lock_in_flight(&self.in_flight);
        reminders
            .into_iter()
            .filter(|reminder| in_flight.remove(&reminder.task.id))
            .count()
    }

    pub fn in_flight_count(&self) -> usize {
        lock_in_flight(&self.in_flight).len()
    }
}

async fn deliver(
    task: ReminderTask,
    task_repo: Arc<dyn TaskRepository>,
    details: Arc<dyn RegimenDetailsLookup>,
    notifications: NotificationService,
) -> DispatchOutcome {
    let reminder_details = match details.reminder_details(task.regimen_id).await {
        Ok(Some(found)) => found,
        Ok(None) => {
            warn!("Regimen #{} for task #{} not found, reminder not sent", task.regimen_id, task.id);
            return DispatchOutcome::DetailsUnavailable;
        }
        Err(e) => {
            error!("Failed to load details for task #{}: {}", task.id, e);
            return DispatchOutcome::DetailsUnavailable;
        }
    };

    if let Err(e) = notifications.send_reminder(&reminder_details, task.due_at).await {
        error!(
            "Failed to send reminder for task #{} to {}: {}",
            task.id, reminder_details.patient_email, e
        );
        return DispatchOutcome::SendFailed;
    }

    if let Err(e) = task_repo.mark_done(task.id).await {
        error!("Reminder for task #{} sent but not marked done: {}", task.id, e);
        return DispatchOutcome::MarkFailed;
    }

    info!("Reminder for task #{} sent to {}", task.id, reminder_details.patient_email);
    DispatchOutcome::Delivered
}
