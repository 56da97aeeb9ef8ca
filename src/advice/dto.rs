use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::meals::repo_types::MealType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealAnalysis {
    pub estimated_calories: f64,
    pub protein_grams: f64,
    pub fat_grams: f64,
    pub carb_grams: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceResult {
    pub advice: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_analysis: Option<MealAnalysis>,
}

/// A generated advice as cached for `GET /advice/last`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdviceRecord {
    pub id: Uuid,
    #[serde(with = "crate::dates::iso_date")]
    pub date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    #[serde(flatten)]
    pub result: AdviceResult,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdviceRequest {
    /// Defaults to today.
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PhotoAdviceRequest {
    pub date: Option<String>,
    pub meal_type: MealType,
    pub image_b64: String,
    pub content_type: Option<String>,
}
