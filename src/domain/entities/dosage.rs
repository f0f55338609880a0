use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Patient-facing status of one scheduled dose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DosageStatus {
    NotTaken,
    Taken,
    Skipped,
}

impl DosageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DosageStatus::NotTaken => "not taken",
            DosageStatus::Taken => "taken",
            DosageStatus::Skipped => "skipped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not taken" => Some(DosageStatus::NotTaken),
            "taken" => Some(DosageStatus::Taken),
            "skipped" => Some(DosageStatus::Skipped),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dosage {
    pub id: u64,
    pub regimen_id: u64,
    pub patient_id: u64,
    pub reminder_time: DateTime<Utc>,
    pub status: DosageStatus,
    pub is_active: bool,
    pub time_taken: Option<DateTime<Utc>>,
    pub time_skipped: Option<DateTime<Utc>>,
}

impl Dosage {
    /// A fresh dose awaiting the patient's action. The id is assigned by the repository.
    pub fn pending(regimen_id: u64, patient_id: u64, reminder_time: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            regimen_id,
            patient_id,
            reminder_time,
            status: DosageStatus::NotTaken,
            is_active: true,
            time_taken: None,
            time_skipped: None,
        }
    }

    /// Whether the patient can still record taking or skipping this dose
    pub fn is_open(&self) -> bool {
        self.is_active && self.status == DosageStatus::NotTaken
    }
}

/// Which of a patient's dosages to list; unset fields do not filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DosageFilter {
    pub patient_id: u64,
    pub regimen_id: Option<u64>,
    pub is_active: Option<bool>,
}

impl DosageFilter {
    pub fn for_patient(patient_id: u64) -> Self {
        Self {
            patient_id,
            ..Self::default()
        }
    }

    pub fn matches(&self, dosage: &Dosage) -> bool {
        dosage.patient_id == self.patient_id
            && self.regimen_id.is_none_or(|id| dosage.regimen_id == id)
            && self.is_active.is_none_or(|active| dosage.is_active == active)
    }
}
