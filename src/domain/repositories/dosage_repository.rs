use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::dosage::{Dosage, DosageFilter, DosageStatus};
use crate::domain::repositories::error::Result;

#[async_trait]
pub trait DosageRepository: Send + Sync {
    /// Persist a batch of dosages in one write; returns how many were stored
    async fn insert_dosages(&self, dosages: &[Dosage]) -> Result<usize>;

    async fn get_dosage(&self, dosage_id: u64) -> Result<Option<Dosage>>;

    /// Record the patient's action on an active dose owned by `patient_id`.
    /// Returns false when no such open dose exists.
    async fn set_status(
        &self,
        dosage_id: u64,
        patient_id: u64,
        status: DosageStatus,
        at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Dosages of a regimen ordered by reminder time
    async fn list_by_regimen(&self, regimen_id: u64) -> Result<Vec<Dosage>>;

    /// A patient's dosages matching `filter`, ordered by reminder time
    async fn list_for_patient(&self, filter: &DosageFilter) -> Result<Vec<Dosage>>;

    async fn delete_by_regimen(&self, regimen_id: u64) -> Result<usize>;
}
