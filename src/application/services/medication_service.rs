use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::application::services::schedule_generator::{ScheduleError, generate_schedule, parse_dose_times};
use crate::domain::entities::dosage::{Dosage, DosageFilter, DosageStatus};
use crate::domain::entities::regimen::{Regimen, RegimenRequest};
use crate::domain::entities::reminder_task::ReminderTask;
use crate::domain::repositories::{DosageRepository, RegimenRepository, RepositoryError, TaskRepository};

#[derive(Debug)]
pub enum MedicationError {
    Validation(ScheduleError),
    InvalidRequest(String),
    NotFound(String),
    Persistence(RepositoryError),
}

impl std::fmt::Display for MedicationError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MedicationError::Validation(err) => write!(f, "Validation error: {}", err),
            MedicationError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            MedicationError::NotFound(msg) => write!(f, "Not found: {}", msg),
            MedicationError::Persistence(err) => write!(f, "Persistence error: {}", err),
        }
    }
}

impl std::error::Error for MedicationError {}

impl From<ScheduleError> for MedicationError {
    fn from(err: ScheduleError) -> Self {
        MedicationError::Validation(err)
    }
}

impl From<RepositoryError> for MedicationError {
    fn from(err: RepositoryError) -> Self {
        MedicationError::Persistence(err)
    }
}

/// Outcome of registering a regimen
#[derive(Debug, Clone)]
pub struct RegimenSchedule {
    pub regimen_id: u64,
    pub reminder_times: Vec<DateTime<Utc>>,
    pub dosages_created: usize,
    pub tasks_created: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegimenRemoval {
    pub dosages_removed: usize,
    pub tasks_removed: usize,
}

/// Regimen lifecycle: materializes a regimen's schedule into dosages and
/// reminder tasks, records the patient's dose actions and removes regimens.
#[derive(Clone)]
pub struct MedicationService {
    regimen_repo: Arc<dyn RegimenRepository>,
    dosage_repo: Arc<dyn DosageRepository>,
    task_repo: Arc<dyn TaskRepository>,
    timezone: Tz,
}

impl MedicationService {
    pub fn new(
        regimen_repo: Arc<dyn RegimenRepository>,
        dosage_repo: Arc<dyn DosageRepository>,
        task_repo: Arc<dyn TaskRepository>,
        timezone: Tz,
    ) -> Self {
        Self {
            regimen_repo,
            dosage_repo,
            task_repo,
            timezone,
        }
    }

    // === REGIMEN CREATION ===

    /// Validates the regimen, generates its schedule and persists one dosage and
    /// one reminder task per due instant. Either batch failing fails the whole call;
    /// nothing already written is rolled back here.
    pub async fn create_regimen(&self, request: &RegimenRequest) -> Result<RegimenSchedule, MedicationError> {
        let reminder_times = generate_schedule(
            request.start_date,
            request.daily_dosage,
            &request.dosage_times,
            request.total_doses,
            &self.timezone,
        )?;
        let dosage_times = parse_dose_times(&request.dosage_times)?;

        let regimen = Regimen::from_request(request, dosage_times);
        let regimen_id = self.regimen_repo.add_regimen(&regimen).await.map_err(|e| {
            error!("Error adding regimen for patient #{}: {}", request.patient_id, e);
            MedicationError::Persistence(e)
        })?;

        let dosages: Vec<Dosage> = reminder_times
            .iter()
            .map(|at| Dosage::pending(regimen_id, request.patient_id, *at))
            .collect();
        let tasks: Vec<ReminderTask> = reminder_times
            .iter()
            .map(|at| ReminderTask::undone(regimen_id, *at))
            .collect();

        let dosages_created = self.dosage_repo.insert_dosages(&dosages).await.map_err(|e| {
            error!("Error saving dosages for regimen #{}: {}", regimen_id, e);
            MedicationError::Persistence(e)
        })?;

        let tasks_created = self.task_repo.insert_tasks(&tasks).await.map_err(|e| {
            error!("Error adding reminder tasks for regimen #{}: {}", regimen_id, e);
            MedicationError::Persistence(e)
        })?;

        info!(
            "Added {} reminder task(s) for regimen #{} '{}'",
            tasks_created, regimen_id, request.name
        );

        Ok(RegimenSchedule {
            regimen_id,
            reminder_times,
            dosages_created,
            tasks_created,
        })
    }

    // === PATIENT DOSE ACTIONS ===

    /// Records that the patient took or skipped a dose. A dose can only leave
    /// "not taken" once.
    pub async fn set_dosage_status(
        &self,
        patient_id: u64,
        dosage_id: u64,
        status: DosageStatus,
    ) -> Result<(), MedicationError> {
        if status == DosageStatus::NotTaken {
            return Err(MedicationError::InvalidRequest("invalid status".to_string()));
        }

        let dosage = self
            .dosage_repo
            .get_dosage(dosage_id)
            .await?
            .ok_or_else(|| MedicationError::NotFound("dosage not found".to_string()))?;

        if !dosage.is_open() {
            return Err(MedicationError::InvalidRequest(
                "status of dosage cannot be set again".to_string(),
            ));
        }

        let updated = self
            .dosage_repo
            .set_status(dosage_id, patient_id, status, Utc::now())
            .await?;
        if !updated {
            return Err(MedicationError::NotFound(
                "dosage not found or not owned by patient".to_string(),
            ));
        }

        if status == DosageStatus::Taken {
            if let Err(e) = self.regimen_repo.increment_dosages_taken(dosage.regimen_id).await {
                warn!("Error incrementing dosages taken for regimen #{}: {}", dosage.regimen_id, e);
            }
        }

        Ok(())
    }

    pub async fn regimen_dosages(&self, regimen_id: u64) -> Result<Vec<Dosage>, MedicationError> {
        Ok(self.dosage_repo.list_by_regimen(regimen_id).await?)
    }

    /// A patient's dosages, optionally narrowed to one regimen or to active ones
    pub async fn patient_dosages(&self, filter: &DosageFilter) -> Result<Vec<Dosage>, MedicationError> {
        self.dosage_repo.list_for_patient(filter).await.map_err(|e| {
            error!("Error getting dosages for patient #{}: {}", filter.patient_id, e);
            MedicationError::Persistence(e)
        })
    }

    pub async fn get_dosage(&self, dosage_id: u64) -> Result<Dosage, MedicationError> {
        self.dosage_repo
            .get_dosage(dosage_id)
            .await?
            .ok_or_else(|| MedicationError::NotFound("dosage not found".to_string()))
    }

    // === REGIMEN REMOVAL ===

    /// Deletes a regimen together with its dosages and reminder tasks
    pub async fn delete_regimen(&self, regimen_id: u64) -> Result<RegimenRemoval, MedicationError> {
        if self.regimen_repo.get_regimen(regimen_id).await?.is_none() {
            return Err(MedicationError::NotFound("regimen not found".to_string()));
        }

        let dosages_removed = self.dosage_repo.delete_by_regimen(regimen_id).await?;
        let tasks_removed = self.task_repo.delete_by_regimen(regimen_id).await?;
        self.regimen_repo.delete_regimen(regimen_id).await?;

        info!(
            "Deleted regimen #{} with {} dosage(s) and {} task(s)",
            regimen_id, dosages_removed, tasks_removed
        );

        Ok(RegimenRemoval {
            dosages_removed,
            tasks_removed,
        })
    }
}
