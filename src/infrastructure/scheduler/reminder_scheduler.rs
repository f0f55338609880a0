use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, sleep_until};
use tracing::{debug, error, info};

use crate::application::services::due_task_scanner::DueTaskScanner;
use crate::application::services::reminder_dispatcher::ReminderDispatcher;
use crate::infrastructure::scheduler::dispatch_queue::DispatchQueue;

pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub scan_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            scan_interval: DEFAULT_SCAN_INTERVAL,
        }
    }
}

/// Periodic scan plus deadline-driven dispatch, on one tokio task
pub struct ReminderScheduler {
    scanner: DueTaskScanner,
    dispatcher: Arc<ReminderDispatcher>,
    config: SchedulerConfig,
}

/// Returned by `start`; stopping it ends the loop
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signals the loop and waits for it to exit. Sends already spawned keep running;
    /// reminders still queued stay undone in the store.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.join.await {
            error!("Reminder scheduler task ended abnormally: {}", e);
        }
        info!("Reminder scheduler stopped");
    }
}

impl ReminderScheduler {
    pub fn new(scanner: DueTaskScanner, dispatcher: Arc<ReminderDispatcher>, config: SchedulerConfig) -> Self {
        Self {
            scanner,
            dispatcher,
            config,
        }
    }

    pub fn start(self) -> SchedulerHandle {
        let (shutdown, shutdown_rx) = watch::channel(false);
        info!(
            "Starting reminder scheduler (scan every {}s, look ahead {}m)",
            self.config.scan_interval.as_secs(),
            self.scanner.lookahead().num_minutes()
        );
        let join = tokio::spawn(self.run(shutdown_rx));
        SchedulerHandle { shutdown, join }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.config.scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut queue = DispatchQueue::new();

        loop {
            let next_deadline = queue.next_deadline();

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.scan(&mut queue).await;
                }
                _ = wait_until(next_deadline) => {
                    for reminder in queue.pop_ready(Instant::now()) {
                        debug!("Firing reminder for task #{}", reminder.task.id);
                        // outcome is logged by the unit of work itself
                        drop(self.dispatcher.fire(reminder));
                    }
                }
            }
        }

        // unfired reminders stay undone; releasing their claims lets the next scan pick them up
        let released = self.dispatcher.release(queue.drain());
        if released > 0 {
            info!("Released {} queued reminder(s) on stop", released);
        }
    }

    async fn scan(&self, queue: &mut DispatchQueue) {
        let now = Utc::now();
        match self.scanner.scan(now).await {
            Ok(batch) => {
                let planned = self.dispatcher.plan(batch, now, Instant::now());
                if !planned.is_empty() {
                    debug!("Queued {} reminder(s)", planned.len());
                }
                queue.extend(planned);
            }
            Err(e) => error!("Reminder scan failed: {}", e),
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
