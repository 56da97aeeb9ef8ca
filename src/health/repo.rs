use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::RwLock;

use super::provider::{DietaryTotals, HealthError, HealthProvider, TimeRange, WorkoutSample};
use super::repo_types::{HealthSample, SampleKind};
use crate::error::{DiaryError, DiaryResult};

/// Write side of the provider: the device pushes what it read from the OS.
#[async_trait]
pub trait HealthSampleSink: Send + Sync {
    /// Upserts samples by `(kind, start, end)` and workouts by `external_id`,
    /// all or nothing. Returns `(samples, workouts)` written.
    async fn record_batch(
        &self,
        samples: Vec<HealthSample>,
        workouts: Vec<WorkoutSample>,
    ) -> DiaryResult<(usize, usize)>;
}

#[derive(Clone)]
pub struct PgHealthStore {
    db: PgPool,
}

impl PgHealthStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn sum(&self, kind: SampleKind, range: TimeRange) -> Result<f64, HealthError> {
        let total = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT COALESCE(SUM(value), 0)::DOUBLE PRECISION
              FROM health_samples
             WHERE kind = $1 AND start_at >= $2 AND start_at < $3
            "#,
        )
        .bind(kind.as_str())
        .bind(range.0)
        .bind(range.1)
        .fetch_one(&self.db)
        .await?;
        Ok(total)
    }
}

async fn upsert_sample_tx(
    tx: &mut Transaction<'_, Postgres>,
    sample: &HealthSample,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO health_samples (kind, value, start_at, end_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (kind, start_at, end_at) DO UPDATE SET value = EXCLUDED.value
        "#,
    )
    .bind(sample.kind.as_str())
    .bind(sample.value)
    .bind(sample.start)
    .bind(sample.end)
    .execute(&mut **tx)
    .await
    .context("upsert health sample")?;
    Ok(())
}

async fn upsert_workout_tx(
    tx: &mut Transaction<'_, Postgres>,
    w: &WorkoutSample,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO health_workouts (external_id, activity_type, start_at, end_at, calories)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (external_id) DO UPDATE
           SET activity_type = EXCLUDED.activity_type,
               start_at = EXCLUDED.start_at,
               end_at = EXCLUDED.end_at,
               calories = EXCLUDED.calories
        "#,
    )
    .bind(&w.external_id)
    .bind(&w.activity_type)
    .bind(w.start)
    .bind(w.end)
    .bind(w.calories)
    .execute(&mut **tx)
    .await
    .context("upsert health workout")?;
    Ok(())
}

fn internal(e: anyhow::Error) -> DiaryError {
    DiaryError::Internal(format!("{e:#}"))
}

#[async_trait]
impl HealthSampleSink for PgHealthStore {
    async fn record_batch(
        &self,
        samples: Vec<HealthSample>,
        workouts: Vec<WorkoutSample>,
    ) -> DiaryResult<(usize, usize)> {
        let mut tx = self.db.begin().await?;
        for s in &samples {
            upsert_sample_tx(&mut tx, s).await.map_err(internal)?;
        }
        for w in &workouts {
            upsert_workout_tx(&mut tx, w).await.map_err(internal)?;
        }
        tx.commit().await?;
        Ok((samples.len(), workouts.len()))
    }
}

#[derive(sqlx::FromRow)]
struct WorkoutSampleRow {
    external_id: String,
    activity_type: String,
    start_at: time::OffsetDateTime,
    end_at: time::OffsetDateTime,
    calories: f64,
}

#[async_trait]
impl HealthProvider for PgHealthStore {
    async fn active_energy_burned(&self, range: TimeRange) -> Result<f64, HealthError> {
        self.sum(SampleKind::ActiveEnergy, range).await
    }

    async fn basal_energy_burned(&self, range: TimeRange) -> Result<f64, HealthError> {
        self.sum(SampleKind::BasalEnergy, range).await
    }

    async fn dietary_totals(&self, range: TimeRange) -> Result<DietaryTotals, HealthError> {
        let totals = sqlx::query_as::<_, DietaryTotals>(
            r#"
            SELECT
                COALESCE(SUM(value) FILTER (WHERE kind = 'dietary_energy'), 0)::DOUBLE PRECISION AS energy_kcal,
                COALESCE(SUM(value) FILTER (WHERE kind = 'protein'), 0)::DOUBLE PRECISION AS protein_g,
                COALESCE(SUM(value) FILTER (WHERE kind = 'fat'), 0)::DOUBLE PRECISION AS fat_g,
                COALESCE(SUM(value) FILTER (WHERE kind = 'carbs'), 0)::DOUBLE PRECISION AS carb_g
              FROM health_samples
             WHERE start_at >= $1 AND start_at < $2
            "#,
        )
        .bind(range.0)
        .bind(range.1)
        .fetch_one(&self.db)
        .await?;
        Ok(totals)
    }

    async fn step_count(&self, range: TimeRange) -> Result<f64, HealthError> {
        self.sum(SampleKind::Steps, range).await
    }

    async fn workouts(&self, range: TimeRange) -> Result<Vec<WorkoutSample>, HealthError> {
        let rows = sqlx::query_as::<_, WorkoutSampleRow>(
            r#"
            SELECT external_id, activity_type, start_at, end_at, calories
              FROM health_workouts
             WHERE start_at >= $1 AND start_at < $2
             ORDER BY start_at ASC
            "#,
        )
        .bind(range.0)
        .bind(range.1)
        .fetch_all(&self.db)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| WorkoutSample {
                external_id: r.external_id,
                activity_type: r.activity_type,
                start: r.start_at,
                end: r.end_at,
                calories: r.calories,
            })
            .collect())
    }
}

/// In-memory provider for tests and the fake state. Can be told to fail.
#[derive(Default)]
pub struct InMemoryHealthStore {
    samples: RwLock<Vec<HealthSample>>,
    workouts: RwLock<Vec<WorkoutSample>>,
    failing: AtomicBool,
}

impl InMemoryHealthStore {
    pub fn fail_queries(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    pub async fn add_sample(&self, sample: HealthSample) {
        let mut samples = self.samples.write().await;
        match samples
            .iter_mut()
            .find(|s| s.kind == sample.kind && s.start == sample.start && s.end == sample.end)
        {
            Some(slot) => slot.value = sample.value,
            None => samples.push(sample),
        }
    }

    pub async fn add_workout(&self, workout: WorkoutSample) {
        let mut workouts = self.workouts.write().await;
        match workouts
            .iter_mut()
            .find(|w| w.external_id == workout.external_id)
        {
            Some(slot) => *slot = workout,
            None => workouts.push(workout),
        }
    }

    fn check(&self) -> Result<(), HealthError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HealthError::Unavailable("provider offline".into()));
        }
        Ok(())
    }

    async fn sum(&self, kind: SampleKind, range: TimeRange) -> Result<f64, HealthError> {
        self.check()?;
        Ok(self
            .samples
            .read()
            .await
            .iter()
            .filter(|s| s.kind == kind && s.start >= range.0 && s.start < range.1)
            .fold(0.0, |acc, s| acc + s.value))
    }
}

#[async_trait]
impl HealthProvider for InMemoryHealthStore {
    async fn active_energy_burned(&self, range: TimeRange) -> Result<f64, HealthError> {
        self.sum(SampleKind::ActiveEnergy, range).await
    }

    async fn basal_energy_burned(&self, range: TimeRange) -> Result<f64, HealthError> {
        self.sum(SampleKind::BasalEnergy, range).await
    }

    async fn dietary_totals(&self, range: TimeRange) -> Result<DietaryTotals, HealthError> {
        Ok(DietaryTotals {
            energy_kcal: self.sum(SampleKind::DietaryEnergy, range).await?,
            protein_g: self.sum(SampleKind::Protein, range).await?,
            fat_g: self.sum(SampleKind::Fat, range).await?,
            carb_g: self.sum(SampleKind::Carbs, range).await?,
        })
    }

    async fn step_count(&self, range: TimeRange) -> Result<f64, HealthError> {
        self.sum(SampleKind::Steps, range).await
    }

    async fn workouts(&self, range: TimeRange) -> Result<Vec<WorkoutSample>, HealthError> {
        self.check()?;
        let mut out: Vec<WorkoutSample> = self
            .workouts
            .read()
            .await
            .iter()
            .filter(|w| w.start >= range.0 && w.start < range.1)
            .cloned()
            .collect();
        out.sort_by_key(|w| w.start);
        Ok(out)
    }
}

#[async_trait]
impl HealthSampleSink for InMemoryHealthStore {
    async fn record_batch(
        &self,
        samples: Vec<HealthSample>,
        workouts: Vec<WorkoutSample>,
    ) -> DiaryResult<(usize, usize)> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DiaryError::Internal("health store offline".into()));
        }
        let counts = (samples.len(), workouts.len());
        for s in samples {
            self.add_sample(s).await;
        }
        for w in workouts {
            self.add_workout(w).await;
        }
        Ok(counts)
    }
}
