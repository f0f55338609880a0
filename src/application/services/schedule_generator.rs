//! Turns a regimen description into the concrete instants its reminders fire at.
//!
//! Clock times are wall-clock times in the application time zone. They are not
//! required to be sorted: whenever the next clock time would not land strictly
//! after the previous dose, the dose moves to the following day. That keeps the
//! schedule strictly increasing however the times are ordered and however the
//! total relates to the daily count.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

const DOSE_TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleError {
    DoseCountMismatch { daily_dosage: u32, dose_times: usize },
    NonPositiveTotal,
    StartDateInPast(NaiveDate),
    NoDoseTimes,
    InvalidDoseTime(String),
    FirstDoseInPast(DateTime<Utc>),
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ScheduleError::DoseCountMismatch { daily_dosage, dose_times } => write!(
                f,
                "Daily dosage ({}) should match the number of dosage times ({})",
                daily_dosage, dose_times
            ),
            ScheduleError::NonPositiveTotal => write!(f, "Total number of dosages must be at least 1"),
            ScheduleError::StartDateInPast(date) => write!(f, "Invalid start date {}: it is in the past", date),
            ScheduleError::NoDoseTimes => write!(f, "No dosage time defined"),
            ScheduleError::InvalidDoseTime(raw) => {
                write!(f, "Invalid dosage time '{}', expected HH:MM:SS", raw)
            }
            ScheduleError::FirstDoseInPast(at) => {
                write!(f, "Invalid reminder time for the first dosage: {} has already passed", at)
            }
        }
    }
}

impl std::error::Error for ScheduleError {}

/// Parses `HH:MM:SS` clock times, rejecting an empty list
pub fn parse_dose_times(raw: &[String]) -> Result<Vec<NaiveTime>, ScheduleError> {
    if raw.is_empty() {
        return Err(ScheduleError::NoDoseTimes);
    }

    raw.iter()
        .map(|t| {
            NaiveTime::parse_from_str(t.trim(), DOSE_TIME_FORMAT)
                .map_err(|_| ScheduleError::InvalidDoseTime(t.clone()))
        })
        .collect()
}

/// Computes the reminder instants for a regimen, relative to the current time
pub fn generate_schedule<Tz: TimeZone>(
    start_date: NaiveDate,
    daily_dosage: u32,
    dose_times: &[String],
    total_doses: u32,
    tz: &Tz,
) -> Result<Vec<DateTime<Utc>>, ScheduleError> {
    generate_schedule_at(start_date, daily_dosage, dose_times, total_doses, tz, Utc::now())
}

/// Same as [`generate_schedule`] with an explicit "now"
pub fn generate_schedule_at<Tz: TimeZone>(
    start_date: NaiveDate,
    daily_dosage: u32,
    dose_times: &[String],
    total_doses: u32,
    tz: &Tz,
    now: DateTime<Utc>,
) -> Result<Vec<DateTime<Utc>>, ScheduleError> {
    if daily_dosage as usize != dose_times.len() {
        return Err(ScheduleError::DoseCountMismatch {
            daily_dosage,
            dose_times: dose_times.len(),
        });
    }

    if total_doses == 0 {
        return Err(ScheduleError::NonPositiveTotal);
    }

    let today = now.with_timezone(tz).date_naive();
    if start_date < today {
        return Err(ScheduleError::StartDateInPast(start_date));
    }

    let times = parse_dose_times(dose_times)?;

    let mut schedule: Vec<DateTime<Utc>> = Vec::with_capacity(total_doses as usize);
    let mut reference_day = start_date;

    for i in 0..total_doses as usize {
        let mut wall = reference_day.and_time(times[i % times.len()]);
        let mut instant = resolve_local(tz, wall);

        if let Some(previous) = schedule.last() {
            if instant <= *previous {
                wall += Duration::days(1);
                instant = resolve_local(tz, wall);
            }
        }

        reference_day = wall.date();
        schedule.push(instant);
    }

    if let Some(first) = schedule.first() {
        if *first <= now {
            return Err(ScheduleError::FirstDoseInPast(*first));
        }
    }

    Ok(schedule)
}

/// Maps a wall-clock time in `tz` to an instant. Ambiguous times (clocks going back)
/// take the earliest instant; times inside a gap (clocks going forward) move to the
/// first wall-clock minute after the gap.
fn resolve_local<Tz: TimeZone>(tz: &Tz, wall: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&wall) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let mut candidate = wall;
            for _ in 0..24 * 60 {
                candidate += Duration::minutes(1);
                if let Some(dt) = tz.from_local_datetime(&candidate).earliest() {
                    return dt.with_timezone(&Utc);
                }
            }
            Utc.from_utc_datetime(&wall)
        }
    }
}
