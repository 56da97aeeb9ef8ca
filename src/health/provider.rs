//! Read-only view of the device health data provider.
//!
//! The provider is injected into `AppState` as a trait object. Queries take a
//! half-open `[start, end)` range and either return a total or typed samples.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

pub type TimeRange = (OffsetDateTime, OffsetDateTime);

/// Opaque provider failure.
#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("health provider unavailable: {0}")]
    Unavailable(String),
    #[error("health query failed: {0}")]
    Query(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, FromRow)]
pub struct DietaryTotals {
    pub energy_kcal: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carb_g: f64,
}

/// A workout session as recorded by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSample {
    pub external_id: String,
    pub activity_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
    pub calories: f64,
}

impl WorkoutSample {
    pub fn duration_minutes(&self) -> f64 {
        ((self.end - self.start).as_seconds_f64() / 60.0).max(0.0)
    }
}

#[async_trait]
pub trait HealthProvider: Send + Sync {
    async fn active_energy_burned(&self, range: TimeRange) -> Result<f64, HealthError>;
    async fn basal_energy_burned(&self, range: TimeRange) -> Result<f64, HealthError>;
    async fn dietary_totals(&self, range: TimeRange) -> Result<DietaryTotals, HealthError>;
    async fn step_count(&self, range: TimeRange) -> Result<f64, HealthError>;
    async fn workouts(&self, range: TimeRange) -> Result<Vec<WorkoutSample>, HealthError>;
}

/// Everything the provider knows about one range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthSnapshot {
    pub active_energy_kcal: f64,
    pub basal_energy_kcal: f64,
    pub steps: f64,
    pub dietary: DietaryTotals,
    pub workouts: Vec<WorkoutSample>,
}

/// Issues the independent provider queries concurrently and joins them.
pub async fn fetch_snapshot(
    provider: &dyn HealthProvider,
    range: TimeRange,
) -> Result<HealthSnapshot, HealthError> {
    let (active_energy_kcal, basal_energy_kcal, dietary, steps, workouts) = tokio::try_join!(
        provider.active_energy_burned(range),
        provider.basal_energy_burned(range),
        provider.dietary_totals(range),
        provider.step_count(range),
        provider.workouts(range),
    )?;
    Ok(HealthSnapshot {
        active_energy_kcal,
        basal_energy_kcal,
        steps,
        dietary,
        workouts,
    })
}
