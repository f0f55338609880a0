use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{OptionalExtension, Row, params};

use crate::domain::entities::regimen::{Regimen, ReminderDetails};
use crate::domain::repositories::error::{RepositoryError, Result};
use crate::domain::repositories::{RegimenDetailsLookup, RegimenRepository};
use crate::infrastructure::database::DatabaseManager;
use crate::infrastructure::repositories::row_mapping::{invalid_column, utc_from_timestamp};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Regimens, plus the patient and medicine joins that reminder messages need
#[derive(Clone)]
pub struct SqliteRegimenRepository {
    db: DatabaseManager,
}

impl SqliteRegimenRepository {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    fn row_to_regimen(row: &Row) -> rusqlite::Result<Regimen> {
        let id: i64 = row.get(0)?;
        let patient_id: i64 = row.get(1)?;
        let medicine_id: i64 = row.get(2)?;
        let start_date: String = row.get(4)?;
        let daily_dosage: i64 = row.get(6)?;
        let dosage_times: String = row.get(7)?;
        let total_doses: i64 = row.get(8)?;
        let dosages_taken: i64 = row.get(9)?;
        let created_ts: i64 = row.get(12)?;

        let start_date = NaiveDate::parse_from_str(&start_date, DATE_FORMAT)
            .map_err(|e| invalid_column(4, format!("bad start date '{}': {}", start_date, e)))?;

        let raw_times: Vec<String> = serde_json::from_str(&dosage_times)
            .map_err(|e| invalid_column(7, format!("bad dosage times: {}", e)))?;
        let dosage_times = raw_times
            .iter()
            .map(|t| {
                NaiveTime::parse_from_str(t, TIME_FORMAT)
                    .map_err(|e| invalid_column(7, format!("bad dosage time '{}': {}", t, e)))
            })
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Regimen {
            id: id as u64,
            patient_id: patient_id as u64,
            medicine_id: medicine_id as u64,
            name: row.get(3)?,
            start_date,
            dosage_quantity: row.get(5)?,
            daily_dosage: daily_dosage as u32,
            dosage_times,
            total_doses: total_doses as u32,
            dosages_taken: dosages_taken as u32,
            treatment: row.get(10)?,
            comment: row.get(11)?,
            created_at: utc_from_timestamp(12, created_ts)?,
        })
    }
}

#[async_trait]
impl RegimenRepository for SqliteRegimenRepository {
    async fn add_regimen(&self, regimen: &Regimen) -> Result<u64> {
        let times: Vec<String> = regimen
            .dosage_times
            .iter()
            .map(|t| t.format(TIME_FORMAT).to_string())
            .collect();
        let times_json = serde_json::to_string(&times).map_err(|e| RepositoryError::InvalidData(e.to_string()))?;
        let regimen = regimen.clone();

        let id = self
            .db
            .execute_blocking(move |conn| {
                conn.execute(
                    "INSERT INTO regimens (patient_id, medicine_id, name, start_date, dosage_quantity,
                        daily_dosage, dosage_times, total_doses, dosages_taken, treatment, comment, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    params![
                        regimen.patient_id as i64,
                        regimen.medicine_id as i64,
                        regimen.name,
                        regimen.start_date.format(DATE_FORMAT).to_string(),
                        regimen.dosage_quantity,
                        regimen.daily_dosage as i64,
                        times_json,
                        regimen.total_doses as i64,
                        regimen.dosages_taken as i64,
                        regimen.treatment,
                        regimen.comment,
                        regimen.created_at.timestamp(),
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        Ok(id as u64)
    }

    async fn get_regimen(&self, regimen_id: u64) -> Result<Option<Regimen>> {
        let regimen = self
            .db
            .execute_blocking(move |conn| {
                conn.query_row(
                    "SELECT id, patient_id, medicine_id, name, start_date, dosage_quantity, daily_dosage,
                            dosage_times, total_doses, dosages_taken, treatment, comment, created_at
                     FROM regimens WHERE id = ?1",
                    params![regimen_id as i64],
                    Self::row_to_regimen,
                )
                .optional()
            })
            .await?;

        Ok(regimen)
    }

    async fn delete_regimen(&self, regimen_id: u64) -> Result<bool> {
        let removed = self
            .db
            .execute_blocking(move |conn| conn.execute("DELETE FROM regimens WHERE id = ?1", params![regimen_id as i64]))
            .await?;

        Ok(removed > 0)
    }

    async fn increment_dosages_taken(&self, regimen_id: u64) -> Result<()> {
        let affected = self
            .db
            .execute_blocking(move |conn| {
                conn.execute(
                    "UPDATE regimens SET dosages_taken = dosages_taken + 1 WHERE id = ?1",
                    params![regimen_id as i64],
                )
            })
            .await?;

        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl RegimenDetailsLookup for SqliteRegimenRepository {
    async fn reminder_details(&self, regimen_id: u64) -> Result<Option<ReminderDetails>> {
        let details = self
            .db
            .execute_blocking(move |conn| {
                conn.query_row(
                    "SELECT r.name, m.name, p.name, p.email, r.dosage_quantity, r.treatment, r.comment
                     FROM regimens r
                     JOIN patients p ON p.id = r.patient_id
                     JOIN medicines m ON m.id = r.medicine_id
                     WHERE r.id = ?1",
                    params![regimen_id as i64],
                    |row| {
                        Ok(ReminderDetails {
                            regimen_name: row.get(0)?,
                            medicine_name: row.get(1)?,
                            patient_name: row.get(2)?,
                            patient_email: row.get(3)?,
                            dosage_quantity: row.get(4)?,
                            treatment: row.get(5)?,
                            comment: row.get(6)?,
                        })
                    },
                )
                .optional()
            })
            .await?;

        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::regimen::RegimenRequest;

    async fn repository() -> SqliteRegimenRepository {
        let db = DatabaseManager::open_in_memory().unwrap();
        db.initialize_database().await.unwrap();
        db.execute_blocking(|conn| {
            conn.execute_batch(
                "INSERT INTO patients (id, name, email) VALUES (1, 'Ada Obi', 'ada@example.com');
                 INSERT INTO medicines (id, name) VALUES (1, 'Coartem');",
            )
        })
        .await
        .unwrap();
        SqliteRegimenRepository::new(db)
    }

    fn regimen() -> Regimen {
        let request = RegimenRequest {
            patient_id: 1,
            medicine_id: 1,
            name: "Malaria course".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
            dosage_quantity: "1 tablet".to_string(),
            daily_dosage: 2,
            dosage_times: vec!["08:00:00".to_string(), "20:00:00".to_string()],
            total_doses: 6,
            treatment: "Malaria".to_string(),
            comment: "after food".to_string(),
        };
        let times = vec![
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        ];
        Regimen::from_request(&request, times)
    }

    #[tokio::test]
    async fn regimen_round_trips_through_storage() {
        let repo = repository().await;
        let stored = regimen();

        let id = repo.add_regimen(&stored).await.unwrap();
        let loaded = repo.get_regimen(id).await.unwrap().unwrap();

        assert_eq!(loaded.id, id);
        assert_eq!(loaded.start_date, stored.start_date);
        assert_eq!(loaded.dosage_times, stored.dosage_times);
        assert_eq!(loaded.total_doses, 6);
        assert_eq!(loaded.created_at.timestamp(), stored.created_at.timestamp());
    }

    #[tokio::test]
    async fn reminder_details_join_patient_and_medicine() {
        let repo = repository().await;
        let id = repo.add_regimen(&regimen()).await.unwrap();

        let details = repo.reminder_details(id).await.unwrap().unwrap();

        assert_eq!(details.medicine_name, "Coartem");
        assert_eq!(details.patient_email, "ada@example.com");
        assert_eq!(details.patient_name, "Ada Obi");
        assert_eq!(details.comment, "after food");
        assert!(repo.reminder_details(id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn taken_counter_and_deletion() {
        let repo = repository().await;
        let id = repo.add_regimen(&regimen()).await.unwrap();

        repo.increment_dosages_taken(id).await.unwrap();
        repo.increment_dosages_taken(id).await.unwrap();
        assert_eq!(repo.get_regimen(id).await.unwrap().unwrap().dosages_taken, 2);

        assert!(repo.delete_regimen(id).await.unwrap());
        assert!(!repo.delete_regimen(id).await.unwrap());
        assert_eq!(repo.increment_dosages_taken(id).await, Err(RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn unknown_patient_is_rejected() {
        let repo = repository().await;
        let mut orphan = regimen();
        orphan.patient_id = 77;

        let err = repo.add_regimen(&orphan).await.unwrap_err();
        assert!(matches!(err, RepositoryError::StorageError(_)));
    }
}
