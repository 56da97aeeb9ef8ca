use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::instrument;

use super::dto::UpdateSettingsRequest;
use super::repo_types::SettingsView;
use super::services::{current_settings, update_settings};
use crate::error::reject;
use crate::state::AppState;

pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).put(put_settings))
}

#[instrument(skip(state))]
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<SettingsView>, (StatusCode, String)> {
    let settings = current_settings(&state).await.map_err(reject)?;
    Ok(Json(SettingsView::from(&settings)))
}

#[instrument(skip(state, body))]
pub async fn put_settings(
    State(state): State<AppState>,
    Json(body): Json<UpdateSettingsRequest>,
) -> Result<Json<SettingsView>, (StatusCode, String)> {
    let settings = update_settings(&state, body).await.map_err(reject)?;
    Ok(Json(SettingsView::from(&settings)))
}
