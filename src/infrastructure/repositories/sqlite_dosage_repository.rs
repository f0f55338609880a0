use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};

use crate::domain::entities::dosage::{Dosage, DosageFilter, DosageStatus};
use crate::domain::repositories::DosageRepository;
use crate::domain::repositories::error::{RepositoryError, Result};
use crate::infrastructure::database::DatabaseManager;
use crate::infrastructure::repositories::row_mapping::{invalid_column, optional_utc, utc_from_timestamp};

const DOSAGE_COLUMNS: &str =
    "id, regimen_id, patient_id, reminder_time, status, is_active, time_taken, time_skipped";

#[derive(Clone)]
pub struct SqliteDosageRepository {
    db: DatabaseManager,
}

impl SqliteDosageRepository {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    fn row_to_dosage(row: &Row) -> rusqlite::Result<Dosage> {
        let id: i64 = row.get(0)?;
        let regimen_id: i64 = row.get(1)?;
        let patient_id: i64 = row.get(2)?;
        let reminder_ts: i64 = row.get(3)?;
        let status: String = row.get(4)?;
        let is_active: i64 = row.get(5)?;

        Ok(Dosage {
            id: id as u64,
            regimen_id: regimen_id as u64,
            patient_id: patient_id as u64,
            reminder_time: utc_from_timestamp(3, reminder_ts)?,
            status: DosageStatus::parse(&status)
                .ok_or_else(|| invalid_column(4, format!("unknown dosage status '{}'", status)))?,
            is_active: is_active != 0,
            time_taken: optional_utc(6, row.get(6)?)?,
            time_skipped: optional_utc(7, row.get(7)?)?,
        })
    }
}

#[async_trait]
impl DosageRepository for SqliteDosageRepository {
    async fn insert_dosages(&self, dosages: &[Dosage]) -> Result<usize> {
        if dosages.is_empty() {
            return Ok(0);
        }
        let dosages = dosages.to_vec();

        let inserted = self
            .db
            .execute_blocking(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO dosages (regimen_id, patient_id, reminder_time, status, is_active)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                    )?;
                    for dosage in &dosages {
                        stmt.execute(params![
                            dosage.regimen_id as i64,
                            dosage.patient_id as i64,
                            dosage.reminder_time.timestamp(),
                            dosage.status.as_str(),
                            dosage.is_active as i64,
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(dosages.len())
            })
            .await?;

        Ok(inserted)
    }

    async fn get_dosage(&self, dosage_id: u64) -> Result<Option<Dosage>> {
        let dosage = self
            .db
            .execute_blocking(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM dosages WHERE id = ?1", DOSAGE_COLUMNS),
                    params![dosage_id as i64],
                    Self::row_to_dosage,
                )
                .optional()
            })
            .await?;

        Ok(dosage)
    }

    async fn set_status(
        &self,
        dosage_id: u64,
        patient_id: u64,
        status: DosageStatus,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let time_column = match status {
            DosageStatus::Taken => "time_taken",
            DosageStatus::Skipped => "time_skipped",
            DosageStatus::NotTaken => {
                return Err(RepositoryError::InvalidData(
                    "a dose cannot be reset to not taken".to_string(),
                ));
            }
        };

        let affected = self
            .db
            .execute_blocking(move |conn| {
                conn.execute(
                    &format!(
                        "UPDATE dosages SET status = ?1, is_active = 0, {} = ?2
                         WHERE id = ?3 AND patient_id = ?4 AND is_active = 1 AND status = ?5",
                        time_column
                    ),
                    params![
                        status.as_str(),
                        at.timestamp(),
                        dosage_id as i64,
                        patient_id as i64,
                        DosageStatus::NotTaken.as_str(),
                    ],
                )
            })
            .await?;

        Ok(affected > 0)
    }

    async fn list_by_regimen(&self, regimen_id: u64) -> Result<Vec<Dosage>> {
        let dosages = self
            .db
            .execute_blocking(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM dosages WHERE regimen_id = ?1 ORDER BY reminder_time ASC, id ASC",
                    DOSAGE_COLUMNS
                ))?;
                stmt.query_map(params![regimen_id as i64], Self::row_to_dosage)?
                    .collect::<rusqlite::Result<Vec<_>>>()
            })
            .await?;

        Ok(dosages)
    }

    async fn list_for_patient(&self, filter: &DosageFilter) -> Result<Vec<Dosage>> {
        let patient_id = filter.patient_id as i64;
        let regimen_id = filter.regimen_id.map(|id| id as i64);
        let is_active = filter.is_active.map(i64::from);

        let dosages = self
            .db
            .execute_blocking(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM dosages
                     WHERE patient_id = ?1
                       AND (?2 IS NULL OR regimen_id = ?2)
                       AND (?3 IS NULL OR is_active = ?3)
                     ORDER BY reminder_time ASC, id ASC",
                    DOSAGE_COLUMNS
                ))?;
                stmt.query_map(params![patient_id, regimen_id, is_active], Self::row_to_dosage)?
                    .collect::<rusqlite::Result<Vec<_>>>()
            })
            .await?;

        Ok(dosages)
    }

    async fn delete_by_regimen(&self, regimen_id: u64) -> Result<usize> {
        let removed = self
            .db
            .execute_blocking(move |conn| conn.execute("DELETE FROM dosages WHERE regimen_id = ?1", params![regimen_id as i64]))
            .await?;

        Ok(removed)
    }
}
