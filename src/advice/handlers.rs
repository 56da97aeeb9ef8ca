use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{AdviceRecord, AdviceRequest, PhotoAdviceRequest};
use super::services::{request_advice, request_photo_advice};
use crate::dates::{parse_date, today_utc};
use crate::error::{reject, DiaryError};
use crate::state::AppState;

pub fn advice_routes() -> Router<AppState> {
    Router::new()
        .route("/advice", post(advise))
        .route(
            "/advice/photo",
            post(advise_photo).layer(DefaultBodyLimit::max(20 * 1024 * 1024)),
        )
        .route("/advice/last", get(last_advice))
}

#[instrument(skip(state))]
pub async fn advise(
    State(state): State<AppState>,
    body: Option<Json<AdviceRequest>>,
) -> Result<Json<AdviceRecord>, (StatusCode, String)> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let today = today_utc();
    let date = match req.date.as_deref() {
        Some(d) => parse_date(d).map_err(reject)?,
        None => today,
    };
    request_advice(&state, date, today)
        .await
        .map(Json)
        .map_err(reject)
}

#[instrument(skip(state, body))]
pub async fn advise_photo(
    State(state): State<AppState>,
    Json(body): Json<PhotoAdviceRequest>,
) -> Result<Json<AdviceRecord>, (StatusCode, String)> {
    request_photo_advice(&state, body, today_utc())
        .await
        .map(Json)
        .map_err(reject)
}

#[instrument(skip(state))]
pub async fn last_advice(
    State(state): State<AppState>,
) -> Result<Json<AdviceRecord>, (StatusCode, String)> {
    match state.advice.last().await.map_err(reject)? {
        Some(rec) => Ok(Json(rec)),
        None => Err(reject(DiaryError::not_found("advice"))),
    }
}
