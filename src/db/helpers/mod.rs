use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::db::models::{WorkoutMode, WorkoutStatus};
use crate::models::ExerciseVariant;

pub fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

pub fn to_u64(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{field} contains negative value {value}"))
}

pub fn to_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{field} value {value} out of range"))
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_optional_datetime(
    value: Option<String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(raw) => parse_datetime(&raw, field).map(Some),
        None => Ok(None),
    }
}

pub fn parse_status(value: &str) -> Result<WorkoutStatus> {
    match value {
        "Running" => Ok(WorkoutStatus::Running),
        "Completed" => Ok(WorkoutStatus::Completed),
        "Cancelled" => Ok(WorkoutStatus::Cancelled),
        "Interrupted" => Ok(WorkoutStatus::Interrupted),
        other => Err(anyhow!("unknown workout status {other}")),
    }
}

pub fn parse_mode(value: &str) -> Result<WorkoutMode> {
    match value {
        "Live" => Ok(WorkoutMode::Live),
        "Upload" => Ok(WorkoutMode::Upload),
        other => Err(anyhow!("unknown workout mode {other}")),
    }
}

pub fn parse_exercise(value: &str) -> Result<ExerciseVariant> {
    value
        .parse::<ExerciseVariant>()
        .map_err(|err| anyhow!("invalid exercise column: {err}"))
}
