//! In-memory repositories and a recording sender for service and scheduler tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex as StdMutex;
use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;

use crate::domain::entities::dosage::{Dosage, DosageFilter, DosageStatus};
use crate::domain::entities::regimen::{Regimen, ReminderDetails};
use crate::domain::entities::reminder_task::{ReminderTask, TaskStatus};
use crate::domain::repositories::error::{RepositoryError, Result};
use crate::domain::repositories::{DosageRepository, RegimenDetailsLookup, RegimenRepository, TaskRepository};
use crate::domain::services::{NotificationError, NotificationSender};

#[derive(Default)]
pub struct MemoryTaskRepository {
    tasks: Mutex<HashMap<u64, ReminderTask>>,
    next_id: Mutex<u64>,
    pub fail_inserts: bool,
}

impl MemoryTaskRepository {
    pub fn failing() -> Self {
        Self {
            fail_inserts: true,
            ..Self::default()
        }
    }

    /// Seed a task directly, returning its id
    pub async fn seed(&self, regimen_id: u64, due_at: DateTime<Utc>, status: TaskStatus) -> u64 {
        let mut task = ReminderTask::undone(regimen_id, due_at);
        task.status = status;
        self.insert_tasks(&[task]).await.unwrap();
        *self.next_id.lock().await
    }

    pub async fn status_of(&self, task_id: u64) -> Option<TaskStatus> {
        self.tasks.lock().await.get(&task_id).map(|t| t.status)
    }

    pub async fn all(&self) -> Vec<ReminderTask> {
        let mut tasks: Vec<ReminderTask> = self.tasks.lock().await.values().cloned().collect();
        tasks.sort_by_key(|t| t.id);
        tasks
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn insert_tasks(&self, tasks: &[ReminderTask]) -> Result<usize> {
        if self.fail_inserts {
            return Err(RepositoryError::StorageError("insert rejected".to_string()));
        }
        let mut stored = self.tasks.lock().await;
        let mut next_id = self.next_id.lock().await;
        for task in tasks {
            *next_id += 1;
            let mut task = task.clone();
            task.id = *next_id;
            stored.insert(task.id, task);
        }
        Ok(tasks.len())
    }

    async fn mark_done(&self, task_id: u64) -> Result<()> {
        let mut stored = self.tasks.lock().await;
        let task = stored.get_mut(&task_id).ok_or(RepositoryError::NotFound)?;
        task.status = TaskStatus::Done;
        Ok(())
    }

    async fn find_due(&self, before: DateTime<Utc>) -> Result<Vec<ReminderTask>> {
        let stored = self.tasks.lock().await;
        let mut due: Vec<ReminderTask> = stored
            .values()
            .filter(|t| t.status == TaskStatus::Undone && t.due_at <= before)
            .cloned()
            .collect();
        due.sort_by_key(|t| (t.due_at, t.id));
        Ok(due)
    }

    async fn delete_by_regimen(&self, regimen_id: u64) -> Result<usize> {
        let mut stored = self.tasks.lock().await;
        let before = stored.len();
        stored.retain(|_, t| t.regimen_id != regimen_id);
        Ok(before - stored.len())
    }
}

#[derive(Default)]
pub struct MemoryDosageRepository {
    dosages: Mutex<HashMap<u64, Dosage>>,
    next_id: Mutex<u64>,
}

#[async_trait]
impl DosageRepository for MemoryDosageRepository {
    async fn insert_dosages(&self, dosages: &[Dosage]) -> Result<usize> {
        let mut stored = self.dosages.lock().await;
        let mut next_id = self.next_id.lock().await;
        for dosage in dosages {
            *next_id += 1;
            let mut dosage = dosage.clone();
            dosage.id = *next_id;
            stored.insert(dosage.id, dosage);
        }
        Ok(dosages.len())
    }

    async fn get_dosage(&self, dosage_id: u64) -> Result<Option<Dosage>> {
        Ok(self.dosages.lock().await.get(&dosage_id).cloned())
    }

    async fn set_status(
        &self,
        dosage_id: u64,
        patient_id: u64,
        status: DosageStatus,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut stored = self.dosages.lock().await;
        match stored.get_mut(&dosage_id) {
            Some(d) if d.patient_id == patient_id && d.is_active => {
                d.status = status;
                d.is_active = false;
                match status {
                    DosageStatus::Taken => d.time_taken = Some(at),
                    DosageStatus::Skipped => d.time_skipped = Some(at),
                    DosageStatus::NotTaken => {}
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_by_regimen(&self, regimen_id: u64) -> Result<Vec<Dosage>> {
        let mut dosages: Vec<Dosage> = self
            .dosages
            .lock()
            .await
            .values()
            .filter(|d| d.regimen_id == regimen_id)
            .cloned()
            .collect();
        dosages.sort_by_key(|d| (d.reminder_time, d.id));
        Ok(dosages)
    }

    async fn list_for_patient(&self, filter: &DosageFilter) -> Result<Vec<Dosage>> {
        let mut dosages: Vec<Dosage> = self
            .dosages
            .lock()
            .await
            .values()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect();
        dosages.sort_by_key(|d| (d.reminder_time, d.id));
        Ok(dosages)
    }

    async fn delete_by_regimen(&self, regimen_id: u64) -> Result<usize> {
        let mut stored = self.dosages.lock().await;
        let before = stored.len();
        stored.retain(|_, d| d.regimen_id != regimen_id);
        Ok(before - stored.len())
    }
}

#[derive(Default)]
pub struct MemoryRegimenRepository {
    regimens: Mutex<HashMap<u64, Regimen>>,
    details: Mutex<HashMap<u64, ReminderDetails>>,
    next_id: Mutex<u64>,
}

impl MemoryRegimenRepository {
    pub async fn with_details(&self, regimen_id: u64, details: ReminderDetails) {
        self.details.lock().await.insert(regimen_id, details);
    }
}

#[async_trait]
impl RegimenRepository for MemoryRegimenRepository {
    async fn add_regimen(&self, regimen: &Regimen) -> Result<u64> {
        let mut next_id = self.next_id.lock().await;
        *next_id += 1;
        let mut regimen = regimen.clone();
        regimen.id = *next_id;
        self.regimens.lock().await.insert(regimen.id, regimen);
        Ok(*next_id)
    }

    async fn get_regimen(&self, regimen_id: u64) -> Result<Option<Regimen>> {
        Ok(self.regimens.lock().await.get(&regimen_id).cloned())
    }

    async fn delete_regimen(&self, regimen_id: u64) -> Result<bool> {
        Ok(self.regimens.lock().await.remove(&regimen_id).is_some())
    }

    async fn increment_dosages_taken(&self, regimen_id: u64) -> Result<()> {
        let mut regimens = self.regimens.lock().await;
        let regimen = regimens.get_mut(&regimen_id).ok_or(RepositoryError::NotFound)?;
        regimen.dosages_taken += 1;
        Ok(())
    }
}

#[async_trait]
impl RegimenDetailsLookup for MemoryRegimenRepository {
    async fn reminder_details(&self, regimen_id: u64) -> Result<Option<ReminderDetails>> {
        Ok(self.details.lock().await.get(&regimen_id).cloned())
    }
}

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub at: Instant,
}

/// Records every send; recipients in `failing` get a transport error instead
#[derive(Default)]
pub struct RecordingSender {
    sent: StdMutex<Vec<SentMessage>>,
    failing: HashSet<String>,
    notify: Option<mpsc::UnboundedSender<SentMessage>>,
}

impl RecordingSender {
    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            failing: recipients.iter().map(|r| r.to_string()).collect(),
            ..Self::default()
        }
    }

    /// A sender that also reports each successful send on the returned channel
    pub fn with_channel() -> (Self, mpsc::UnboundedReceiver<SentMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                notify: Some(tx),
                ..Self::default()
            },
            rx,
        )
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> std::result::Result<(), NotificationError> {
        if self.failing.contains(recipient) {
            return Err(NotificationError::Transport(format!("mailbox {} unreachable", recipient)));
        }
        let message = SentMessage {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            at: Instant::now(),
        };
        self.sent.lock().unwrap().push(message.clone());
        if let Some(tx) = &self.notify {
            let _ = tx.send(message);
        }
        Ok(())
    }
}

pub fn details_for(patient_email: &str, medicine_name: &str) -> ReminderDetails {
    ReminderDetails {
        regimen_name: format!("{} course", medicine_name),
        medicine_name: medicine_name.to_string(),
        patient_name: "Ada Obi".to_string(),
        patient_email: patient_email.to_string(),
        dosage_quantity: "1 tablet".to_string(),
        treatment: "Malaria".to_string(),
        comment: String::new(),
    }
}
