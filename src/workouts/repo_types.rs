use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::DiaryError;
use crate::memory::Keyed;

/// Where a workout came from. Synced rows mirror health provider sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutSource {
    Manual,
    Synced,
}

impl WorkoutSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Synced => "synced",
        }
    }
}

impl std::str::FromStr for WorkoutSource {
    type Err = DiaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "synced" => Ok(Self::Synced),
            other => Err(DiaryError::bad_request(format!("unknown workout source '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutRecord {
    pub id: Uuid,
    #[serde(with = "crate::dates::iso_date")]
    pub date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
    pub activity_type: String,
    pub duration_minutes: f64,
    pub calories: f64,
    pub source: WorkoutSource,
    pub external_id: Option<String>,
}

impl Keyed for WorkoutRecord {
    fn key(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkout {
    pub date: Date,
    pub recorded_at: OffsetDateTime,
    pub activity_type: String,
    pub duration_minutes: f64,
    pub calories: f64,
    pub source: WorkoutSource,
    pub external_id: Option<String>,
}

impl NewWorkout {
    pub fn into_record(self, id: Uuid) -> WorkoutRecord {
        WorkoutRecord {
            id,
            date: self.date,
            recorded_at: self.recorded_at,
            activity_type: self.activity_type,
            duration_minutes: self.duration_minutes,
            calories: self.calories,
            source: self.source,
            external_id: self.external_id,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct WorkoutRow {
    pub id: Uuid,
    pub date: Date,
    pub recorded_at: OffsetDateTime,
    pub activity_type: String,
    pub duration_minutes: f64,
    pub calories: f64,
    pub source: String,
    pub external_id: Option<String>,
}

impl TryFrom<WorkoutRow> for WorkoutRecord {
    type Error = DiaryError;

    fn try_from(r: WorkoutRow) -> Result<Self, Self::Error> {
        let source = r
            .source
            .parse()
            .map_err(|_| DiaryError::Internal(format!("stored workout source '{}'", r.source)))?;
        Ok(Self {
            id: r.id,
            date: r.date,
            recorded_at: r.recorded_at,
            activity_type: r.activity_type,
            duration_minutes: r.duration_minutes,
            calories: r.calories,
            source,
            external_id: r.external_id,
        })
    }
}
