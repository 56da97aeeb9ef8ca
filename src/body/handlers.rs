use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::{info, instrument};

use super::repo_types::{BodyRecord, BodyRequest};
use crate::dates::{parse_date, today_utc};
use crate::error::reject;
use crate::meals::dto::DateQuery;
use crate::state::AppState;

pub fn body_routes() -> Router<AppState> {
    Router::new().route("/body", get(get_body).post(append_body))
}

#[derive(Debug, Serialize)]
pub struct BodyDay {
    pub latest: Option<BodyRecord>,
    pub history: Vec<BodyRecord>,
}

#[instrument(skip(state))]
pub async fn get_body(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> Result<Json<BodyDay>, (StatusCode, String)> {
    let date = match q.date.as_deref() {
        Some(d) => parse_date(d).map_err(reject)?,
        None => today_utc(),
    };
    let history = state.body.history_for_date(date).await.map_err(reject)?;
    Ok(Json(BodyDay {
        latest: history.first().cloned(),
        history,
    }))
}

#[instrument(skip(state, body))]
pub async fn append_body(
    State(state): State<AppState>,
    Json(body): Json<BodyRequest>,
) -> Result<(StatusCode, Json<BodyRecord>), (StatusCode, String)> {
    let record = body.into_record().map_err(reject)?;
    let saved = state.body.append(record).await.map_err(reject)?;
    info!(body_id = %saved.id, weight_kg = saved.weight_kg, "body record appended");
    Ok((StatusCode::CREATED, Json(saved)))
}
