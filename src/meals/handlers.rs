use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use base64ct::{Base64, Encoding};
use bytes::Bytes;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{AnalyzePhotoBase64, DateQuery, MealPhotoAnalysis, MealRequest};
use super::repo_types::MealRecord;
use super::services::analyze_meal_photo;
use crate::advice::client::ImageAttachment;
use crate::advice::services::{image_attachment, DEFAULT_IMAGE_TYPE};
use crate::dates::{parse_date, today_utc};
use crate::error::{reject, DiaryError};
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals))
        .route("/meals/:id", get(get_meal))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", post(create_meal))
        .route("/meals/:id", put(put_meal).delete(delete_meal))
        .route("/meals/analyze", post(analyze_multipart)) // multipart field "file"
        .route("/meals/analyze/base64", post(analyze_base64))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> Result<Json<Vec<MealRecord>>, (StatusCode, String)> {
    let date = match q.date.as_deref() {
        Some(d) => parse_date(d).map_err(reject)?,
        None => today_utc(),
    };
    let meals = state.meals.list_by_date(date).await.map_err(reject)?;
    Ok(Json(meals))
}

#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MealRecord>, (StatusCode, String)> {
    state.meals.get(id).await.map(Json).map_err(reject)
}

#[instrument(skip(state, body))]
pub async fn create_meal(
    State(state): State<AppState>,
    Json(body): Json<MealRequest>,
) -> Result<(StatusCode, Json<MealRecord>), (StatusCode, String)> {
    let new = body.validate().map_err(reject)?;
    let meal = state.meals.insert(new).await.map_err(reject)?;
    info!(meal_id = %meal.id, calories = meal.calories, "meal created");
    Ok((StatusCode::CREATED, Json(meal)))
}

#[instrument(skip(state, body))]
pub async fn put_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<MealRequest>,
) -> Result<Json<MealRecord>, (StatusCode, String)> {
    let edit = body.validate().map_err(reject)?;
    state.meals.update(id, edit).await.map(Json).map_err(reject)
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    state.meals.delete(id).await.map_err(reject)?;
    info!(meal_id = %id, "meal deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /meals/analyze (multipart)
/// Field: `file` (or `image`), one photo. Other fields are ignored.
#[instrument(skip(state, mp))]
pub async fn analyze_multipart(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> Result<Json<MealPhotoAnalysis>, (StatusCode, String)> {
    let mut image: Option<ImageAttachment> = None;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| reject(DiaryError::bad_request(e.to_string())))?
    {
        if !matches!(field.name(), Some("file") | Some("image")) {
            continue;
        }
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| DEFAULT_IMAGE_TYPE.into());
        let data: Bytes = field
            .bytes()
            .await
            .map_err(|e| reject(DiaryError::bad_request(e.to_string())))?;
        if data.is_empty() {
            warn!("empty photo upload");
            return Err(reject(DiaryError::bad_request("file is empty")));
        }
        image = Some(ImageAttachment {
            content_type,
            base64: Base64::encode_string(&data),
        });
        break;
    }

    let Some(image) = image else {
        return Err(reject(DiaryError::bad_request("file is required")));
    };
    analyze_meal_photo(&state, image).await.map(Json).map_err(reject)
}

/// POST /meals/analyze/base64 { image_b64: "...", content_type?: "image/jpeg" }
#[instrument(skip(state, body))]
pub async fn analyze_base64(
    State(state): State<AppState>,
    Json(body): Json<AnalyzePhotoBase64>,
) -> Result<Json<MealPhotoAnalysis>, (StatusCode, String)> {
    let image = image_attachment(&body.image_b64, body.content_type.as_deref()).map_err(reject)?;
    analyze_meal_photo(&state, image).await.map(Json).map_err(reject)
}
