use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// What a patient submits when registering a medication regimen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimenRequest {
    pub patient_id: u64,
    pub medicine_id: u64,
    pub name: String,
    pub start_date: NaiveDate,
    pub dosage_quantity: String,
    pub daily_dosage: u32,
    pub dosage_times: Vec<String>, // "HH:MM:SS"
    pub total_doses: u32,
    pub treatment: String,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Regimen {
    pub id: u64,
    pub patient_id: u64,
    pub medicine_id: u64,
    pub name: String,
    pub start_date: NaiveDate,
    pub dosage_quantity: String,
    pub daily_dosage: u32,
    pub dosage_times: Vec<NaiveTime>,
    pub total_doses: u32,
    pub dosages_taken: u32,
    pub treatment: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl Regimen {
    /// Builds the record to persist from an accepted request. The id is assigned by the repository.
    pub fn from_request(request: &RegimenRequest, dosage_times: Vec<NaiveTime>) -> Self {
        Self {
            id: 0,
            patient_id: request.patient_id,
            medicine_id: request.medicine_id,
            name: request.name.clone(),
            start_date: request.start_date,
            dosage_quantity: request.dosage_quantity.clone(),
            daily_dosage: request.daily_dosage,
            dosage_times,
            total_doses: request.total_doses,
            dosages_taken: 0,
            treatment: request.treatment.clone(),
            comment: request.comment.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Everything a reminder message needs, resolved from a task's regimen id at send time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderDetails {
    pub regimen_name: String,
    pub medicine_name: String,
    pub patient_name: String,
    pub patient_email: String,
    pub dosage_quantity: String,
    pub treatment: String,
    pub comment: String,
}
