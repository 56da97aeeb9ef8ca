use async_trait::async_trait;
use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use super::repo_types::{NewWorkout, WorkoutRecord, WorkoutRow};
use crate::error::{DiaryError, DiaryResult};
use crate::memory::Table;

#[async_trait]
pub trait WorkoutRepo: Send + Sync {
    async fn insert(&self, workout: NewWorkout) -> DiaryResult<WorkoutRecord>;
    async fn get(&self, id: Uuid) -> DiaryResult<WorkoutRecord>;
    async fn find_by_external_id(&self, external_id: &str) -> DiaryResult<Option<WorkoutRecord>>;
    async fn list_by_date(&self, date: Date) -> DiaryResult<Vec<WorkoutRecord>>;
    /// Workouts with `from <= date <= to`.
    async fn list_between(&self, from: Date, to: Date) -> DiaryResult<Vec<WorkoutRecord>>;
    async fn update(&self, id: Uuid, workout: NewWorkout) -> DiaryResult<WorkoutRecord>;
    async fn delete(&self, id: Uuid) -> DiaryResult<()>;
}

const WORKOUT_COLUMNS: &str =
    "id, date, recorded_at, activity_type, duration_minutes, calories, source, external_id";

#[derive(Clone)]
pub struct PgWorkoutRepo {
    db: PgPool,
}

impl PgWorkoutRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WorkoutRepo for PgWorkoutRepo {
    async fn insert(&self, w: NewWorkout) -> DiaryResult<WorkoutRecord> {
        let row = sqlx::query_as::<_, WorkoutRow>(&format!(
            r#"
            INSERT INTO workouts (id, date, recorded_at, activity_type, duration_minutes,
                                  calories, source, external_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {WORKOUT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(w.date)
        .bind(w.recorded_at)
        .bind(&w.activity_type)
        .bind(w.duration_minutes)
        .bind(w.calories)
        .bind(w.source.as_str())
        .bind(&w.external_id)
        .fetch_one(&self.db)
        .await?;
        row.try_into()
    }

    async fn get(&self, id: Uuid) -> DiaryResult<WorkoutRecord> {
        sqlx::query_as::<_, WorkoutRow>(&format!(
            "SELECT {WORKOUT_COLUMNS} FROM workouts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| DiaryError::not_found(format!("workout {id}")))?
        .try_into()
    }

    async fn find_by_external_id(&self, external_id: &str) -> DiaryResult<Option<WorkoutRecord>> {
        let row = sqlx::query_as::<_, WorkoutRow>(&format!(
            "SELECT {WORKOUT_COLUMNS} FROM workouts WHERE external_id = $1"
        ))
        .bind(external_id)
        .fetch_optional(&self.db)
        .await?;
        row.map(WorkoutRecord::try_from).transpose()
    }

    async fn list_by_date(&self, date: Date) -> DiaryResult<Vec<WorkoutRecord>> {
        self.list_between(date, date).await
    }

    async fn list_between(&self, from: Date, to: Date) -> DiaryResult<Vec<WorkoutRecord>> {
        let rows = sqlx::query_as::<_, WorkoutRow>(&format!(
            r#"
            SELECT {WORKOUT_COLUMNS}
              FROM workouts
             WHERE date BETWEEN $1 AND $2
             ORDER BY recorded_at ASC
            "#
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(WorkoutRecord::try_from).collect()
    }

    async fn update(&self, id: Uuid, w: NewWorkout) -> DiaryResult<WorkoutRecord> {
        sqlx::query_as::<_, WorkoutRow>(&format!(
            r#"
            UPDATE workouts
               SET date = $2, recorded_at = $3, activity_type = $4, duration_minutes = $5,
                   calories = $6, source = $7, external_id = $8
             WHERE id = $1
            RETURNING {WORKOUT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(w.date)
        .bind(w.recorded_at)
        .bind(&w.activity_type)
        .bind(w.duration_minutes)
        .bind(w.calories)
        .bind(w.source.as_str())
        .bind(&w.external_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| DiaryError::not_found(format!("workout {id}")))?
        .try_into()
    }

    async fn delete(&self, id: Uuid) -> DiaryResult<()> {
        let res = sqlx::query("DELETE FROM workouts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(DiaryError::not_found(format!("workout {id}")));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryWorkoutRepo {
    table: Table<WorkoutRecord>,
}

#[async_trait]
impl WorkoutRepo for InMemoryWorkoutRepo {
    async fn insert(&self, w: NewWorkout) -> DiaryResult<WorkoutRecord> {
        Ok(self.table.insert(w.into_record(Uuid::new_v4())).await)
    }

    async fn get(&self, id: Uuid) -> DiaryResult<WorkoutRecord> {
        self.table
            .get(id)
            .await
            .ok_or_else(|| DiaryError::not_found(format!("workout {id}")))
    }

    async fn find_by_external_id(&self, external_id: &str) -> DiaryResult<Option<WorkoutRecord>> {
        Ok(self
            .table
            .filter(|w| w.external_id.as_deref() == Some(external_id))
            .await
            .into_iter()
            .next())
    }

    async fn list_by_date(&self, date: Date) -> DiaryResult<Vec<WorkoutRecord>> {
        self.list_between(date, date).await
    }

    async fn list_between(&self, from: Date, to: Date) -> DiaryResult<Vec<WorkoutRecord>> {
        let mut rows = self.table.filter(|w| w.date >= from && w.date <= to).await;
        rows.sort_by_key(|w| w.recorded_at);
        Ok(rows)
    }

    async fn update(&self, id: Uuid, w: NewWorkout) -> DiaryResult<WorkoutRecord> {
        let record = w.into_record(id);
        if !self.table.replace(record.clone()).await {
            return Err(DiaryError::not_found(format!("workout {id}")));
        }
        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> DiaryResult<()> {
        if !self.table.remove(id).await {
            return Err(DiaryError::not_found(format!("workout {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod workout_repo_tests {
    use super::*;
    use crate::workouts::repo_types::WorkoutSource;
    use time::macros::date;

    fn run(date: Date, external_id: Option<&str>) -> NewWorkout {
        NewWorkout {
            date,
            recorded_at: date.midnight().assume_utc(),
            activity_type: "running".into(),
            duration_minutes: 30.0,
            calories: 300.0,
            source: if external_id.is_some() {
                WorkoutSource::Synced
            } else {
                WorkoutSource::Manual
            },
            external_id: external_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn finds_synced_by_external_id() {
        let repo = InMemoryWorkoutRepo::default();
        repo.insert(run(date!(2024 - 04 - 26), None)).await.unwrap();
        let synced = repo
            .insert(run(date!(2024 - 04 - 26), Some("hk-1")))
            .await
            .unwrap();

        assert_eq!(repo.find_by_external_id("hk-1").await.unwrap(), Some(synced));
        assert_eq!(repo.find_by_external_id("hk-2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_and_delete_unknown_are_not_found() {
        let repo = InMemoryWorkoutRepo::default();
        let kept = repo.insert(run(date!(2024 - 04 - 26), None)).await.unwrap();

        let missing = Uuid::new_v4();
        assert!(matches!(
            repo.update(missing, run(date!(2024 - 04 - 26), None)).await,
            Err(DiaryError::NotFound(_))
        ));
        assert!(matches!(
            repo.delete(missing).await,
            Err(DiaryError::NotFound(_))
        ));
        assert_eq!(repo.list_by_date(date!(2024 - 04 - 26)).await.unwrap(), vec![kept]);
    }
}
