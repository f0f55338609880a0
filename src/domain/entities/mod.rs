pub mod dosage;
pub mod pending_reminder;
pub mod regimen;
pub mod reminder_task;

pub use dosage::{Dosage, DosageFilter, DosageStatus};
pub use pending_reminder::PendingReminder;
pub use regimen::{Regimen, RegimenRequest, ReminderDetails};
pub use reminder_task::{ReminderTask, TaskStatus};
