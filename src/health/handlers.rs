use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{IngestRequest, IngestResponse};
use super::provider::{fetch_snapshot, HealthSnapshot};
use crate::dates::{day_range, parse_date};
use crate::error::reject;
use crate::state::AppState;

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health/samples", post(ingest_samples))
        .route("/health/daily/:date", get(daily_health))
}

#[instrument(skip(state, body))]
pub async fn ingest_samples(
    State(state): State<AppState>,
    Json(body): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, (StatusCode, String)> {
    body.validate().map_err(reject)?;
    let (samples, workouts) = state
        .health_sink
        .record_batch(body.samples, body.workouts)
        .await
        .map_err(reject)?;
    info!(samples, workouts, "health data ingested");
    Ok(Json(IngestResponse { samples, workouts }))
}

/// Raw provider view of a day. Unlike the summary, provider errors surface here.
#[instrument(skip(state))]
pub async fn daily_health(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<HealthSnapshot>, (StatusCode, String)> {
    let date = parse_date(&date).map_err(reject)?;
    let range = day_range(date).map_err(reject)?;
    match fetch_snapshot(state.health.as_ref(), range).await {
        Ok(snap) => Ok(Json(snap)),
        Err(e) => {
            warn!(error = %e, "health snapshot failed");
            Err((StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}
