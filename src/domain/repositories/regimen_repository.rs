use async_trait::async_trait;

use crate::domain::entities::regimen::{Regimen, ReminderDetails};
use crate::domain::repositories::error::Result;

#[async_trait]
pub trait RegimenRepository: Send + Sync {
    /// Store a regimen and return its assigned id
    async fn add_regimen(&self, regimen: &Regimen) -> Result<u64>;

    async fn get_regimen(&self, regimen_id: u64) -> Result<Option<Regimen>>;

    /// Returns false if the regimen did not exist
    async fn delete_regimen(&self, regimen_id: u64) -> Result<bool>;

    async fn increment_dosages_taken(&self, regimen_id: u64) -> Result<()>;
}

/// Resolves the message content for a task's owning regimen at send time
#[async_trait]
pub trait RegimenDetailsLookup: Send + Sync {
    async fn reminder_details(&self, regimen_id: u64) -> Result<Option<ReminderDetails>>;
}
