pub mod due_task_scanner;
pub mod medication_service;
pub mod notification_service;
pub mod reminder_dispatcher;
pub mod schedule_generator;

pub use due_task_scanner::DueTaskScanner;
pub use medication_service::{MedicationError, MedicationService};
pub use notification_service::NotificationService;
pub use reminder_dispatcher::{DispatchOutcome, ReminderDispatcher};
