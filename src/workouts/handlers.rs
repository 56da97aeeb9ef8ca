use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{SyncRequest, SyncResponse, WorkoutRequest};
use super::repo_types::WorkoutRecord;
use super::services::{edit_workout, sync_workouts};
use crate::dates::{parse_date, today_utc};
use crate::error::reject;
use crate::meals::dto::DateQuery;
use crate::state::AppState;

pub fn workout_routes() -> Router<AppState> {
    Router::new()
        .route("/workouts", get(list_workouts).post(create_workout))
        .route("/workouts/sync", post(sync))
        .route(
            "/workouts/:id",
            get(get_workout).put(put_workout).delete(delete_workout),
        )
}

#[instrument(skip(state))]
pub async fn list_workouts(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> Result<Json<Vec<WorkoutRecord>>, (StatusCode, String)> {
    let date = match q.date.as_deref() {
        Some(d) => parse_date(d).map_err(reject)?,
        None => today_utc(),
    };
    let rows = state.workouts.list_by_date(date).await.map_err(reject)?;
    Ok(Json(rows))
}

#[instrument(skip(state, body))]
pub async fn create_workout(
    State(state): State<AppState>,
    Json(body): Json<WorkoutRequest>,
) -> Result<(StatusCode, Json<WorkoutRecord>), (StatusCode, String)> {
    let new = body.validate().map_err(reject)?;
    let record = state.workouts.insert(new).await.map_err(reject)?;
    info!(workout_id = %record.id, calories = record.calories, "workout created");
    Ok((StatusCode::CREATED, Json(record)))
}

#[instrument(skip(state))]
pub async fn get_workout(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkoutRecord>, (StatusCode, String)> {
    state.workouts.get(id).await.map(Json).map_err(reject)
}

#[instrument(skip(state, body))]
pub async fn put_workout(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<WorkoutRequest>,
) -> Result<Json<WorkoutRecord>, (StatusCode, String)> {
    let edit = body.validate().map_err(reject)?;
    let record = edit_workout(&state, id, edit).await.map_err(reject)?;
    Ok(Json(record))
}

#[instrument(skip(state))]
pub async fn delete_workout(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    state.workouts.delete(id).await.map_err(reject)?;
    info!(workout_id = %id, "workout deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn sync(
    State(state): State<AppState>,
    Json(body): Json<SyncRequest>,
) -> Result<Json<SyncResponse>, (StatusCode, String)> {
    let date = match body.date.as_deref() {
        Some(d) => parse_date(d).map_err(reject)?,
        None => today_utc(),
    };
    sync_workouts(&state, date).await.map(Json).map_err(reject)
}
