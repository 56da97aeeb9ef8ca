use time::Date;
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::SyncResponse;
use super::repo_types::{NewWorkout, WorkoutRecord, WorkoutSource};
use crate::dates::day_range;
use crate::error::{DiaryError, DiaryResult};
use crate::state::AppState;

/// Edits keep the original source and provider id.
pub async fn edit_workout(
    st: &AppState,
    id: Uuid,
    mut edit: NewWorkout,
) -> DiaryResult<WorkoutRecord> {
    let existing = st.workouts.get(id).await?;
    edit.source = existing.source;
    edit.external_id = existing.external_id;
    st.workouts.update(id, edit).await
}

/// Imports the provider's workout sessions for `date` as synced records.
/// Sessions already imported (same external id) are skipped.
#[instrument(skip(st))]
pub async fn sync_workouts(st: &AppState, date: Date) -> DiaryResult<SyncResponse> {
    let sessions = st
        .health
        .workouts(day_range(date)?)
        .await
        .map_err(|e| DiaryError::Upstream(e.to_string()))?;

    let mut imported = Vec::new();
    let mut skipped = 0usize;
    for s in sessions {
        if st.workouts.find_by_external_id(&s.external_id).await?.is_some() {
            skipped += 1;
            continue;
        }
        let minutes = s.duration_minutes();
        let record = st
            .workouts
            .insert(NewWorkout {
                date,
                recorded_at: s.start,
                activity_type: s.activity_type,
                duration_minutes: minutes,
                calories: s.calories,
                source: WorkoutSource::Synced,
                external_id: Some(s.external_id),
            })
            .await?;
        imported.push(record);
    }
    info!(imported = imported.len(), skipped, "workouts synced");
    Ok(SyncResponse { imported, skipped })
}

#[cfg(test)]
mod sync_tests {
    use super::*;
    use crate::health::provider::WorkoutSample;
    use time::macros::{date, datetime};

    #[tokio::test]
    async fn sync_imports_once() {
        let (st, fakes) = AppState::fake_with_handles();
        fakes
            .health
            .add_workout(WorkoutSample {
                external_id: "hk-run-1".into(),
                activity_type: "running".into(),
                start: datetime!(2024-04-26 07:00 UTC),
                end: datetime!(2024-04-26 07:45 UTC),
                calories: 420.0,
            })
            .await;

        let first = sync_workouts(&st, date!(2024 - 04 - 26)).await.unwrap();
        assert_eq!(first.imported.len(), 1);
        assert_eq!(first.imported[0].source, WorkoutSource::Synced);
        assert_eq!(first.imported[0].duration_minutes, 45.0);

        let second = sync_workouts(&st, date!(2024 - 04 - 26)).await.unwrap();
        assert!(second.imported.is_empty());
        assert_eq!(second.skipped, 1);
    }

    #[tokio::test]
    async fn provider_failure_is_upstream() {
        let (st, fakes) = AppState::fake_with_handles();
        fakes.health.fail_queries(true);
        let err = sync_workouts(&st, date!(2024 - 04 - 26)).await.unwrap_err();
        assert!(matches!(err, DiaryError::Upstream(_)));
    }
}
