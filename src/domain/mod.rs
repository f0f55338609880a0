pub mod entities;
pub mod repositories;
pub mod services;

pub use entities::{Dosage, DosageFilter, DosageStatus, PendingReminder, Regimen, RegimenRequest, ReminderDetails, ReminderTask, TaskStatus};
pub use repositories::RepositoryError;
