//! Conversions between stored column values and domain types; used inside spawn_blocking closures.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Type;

use crate::domain::repositories::RepositoryError;

/// Conversion error for a column holding a value the domain cannot represent
pub fn invalid_column(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(RepositoryError::InvalidData(message)))
}

pub fn utc_from_timestamp(column: usize, ts: i64) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_opt(ts, 0)
        .single()
        .ok_or_else(|| invalid_column(column, format!("invalid timestamp {}", ts)))
}

pub fn optional_utc(column: usize, ts: Option<i64>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    ts.map(|t| utc_from_timestamp(column, t)).transpose()
}
