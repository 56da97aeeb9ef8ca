use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use super::repo_types::{NewWorkout, WorkoutRecord, WorkoutSource};
use crate::error::{DiaryError, DiaryResult};
use crate::meals::dto::ensure_amount;

/// Manual workout entry. Synced workouts come only through `/workouts/sync`.
#[derive(Debug, Deserialize)]
pub struct WorkoutRequest {
    #[serde(with = "crate::dates::iso_date")]
    pub date: Date,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub recorded_at: Option<OffsetDateTime>,
    pub activity_type: String,
    pub duration_minutes: f64,
    pub calories: f64,
}

impl WorkoutRequest {
    pub fn validate(self) -> DiaryResult<NewWorkout> {
        let activity_type = self.activity_type.trim().to_string();
        if activity_type.is_empty() {
            return Err(DiaryError::bad_request("activity_type is required"));
        }
        ensure_amount("duration_minutes", self.duration_minutes)?;
        ensure_amount("calories", self.calories)?;
        Ok(NewWorkout {
            date: self.date,
            recorded_at: self.recorded_at.unwrap_or_else(OffsetDateTime::now_utc),
            activity_type,
            duration_minutes: self.duration_minutes,
            calories: self.calories,
            source: WorkoutSource::Manual,
            external_id: None,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    /// Defaults to today.
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub imported: Vec<WorkoutRecord>,
    pub skipped: usize,
}
