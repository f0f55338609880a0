pub mod dispatch_queue;
pub mod reminder_scheduler;

pub use reminder_scheduler::{ReminderScheduler, SchedulerConfig, SchedulerHandle};
