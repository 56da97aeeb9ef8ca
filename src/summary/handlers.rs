use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::model::{DailySummary, MonthlyProgress};
use super::services::{build_daily_summary, monthly_progress};
use crate::dates::{parse_date, parse_month, today_utc};
use crate::error::reject;
use crate::state::AppState;

pub fn summary_routes() -> Router<AppState> {
    Router::new()
        .route("/summary/:date", get(daily_summary))
        .route("/summary/month/:month", get(month_summary))
}

#[instrument(skip(state))]
pub async fn daily_summary(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DailySummary>, (StatusCode, String)> {
    let date = parse_date(&date).map_err(reject)?;
    build_daily_summary(&state, date, today_utc())
        .await
        .map(Json)
        .map_err(reject)
}

#[instrument(skip(state))]
pub async fn month_summary(
    State(state): State<AppState>,
    Path(month): Path<String>,
) -> Result<Json<MonthlyProgress>, (StatusCode, String)> {
    let (year, month) = parse_month(&month).map_err(reject)?;
    monthly_progress(&state, year, month, today_utc())
        .await
        .map(Json)
        .map_err(reject)
}
