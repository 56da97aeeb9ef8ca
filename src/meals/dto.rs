use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use super::repo_types::{MealType, NewMeal};
use crate::error::{DiaryError, DiaryResult};

#[derive(Debug, Deserialize)]
pub struct MealRequest {
    #[serde(with = "crate::dates::iso_date")]
    pub date: Date,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub recorded_at: Option<OffsetDateTime>,
    pub meal_type: MealType,
    pub calories: f64,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub carb_g: Option<f64>,
    #[serde(default)]
    pub description: String,
    pub memo: Option<String>,
}

pub(crate) fn ensure_amount(field: &str, value: f64) -> DiaryResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(DiaryError::bad_request(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}

impl MealRequest {
    pub fn validate(self) -> DiaryResult<NewMeal> {
        ensure_amount("calories", self.calories)?;
        for (field, v) in [
            ("protein_g", self.protein_g),
            ("fat_g", self.fat_g),
            ("carb_g", self.carb_g),
        ] {
            if let Some(v) = v {
                ensure_amount(field, v)?;
            }
        }
        Ok(NewMeal {
            date: self.date,
            recorded_at: self.recorded_at.unwrap_or_else(OffsetDateTime::now_utc),
            meal_type: self.meal_type,
            calories: self.calories,
            protein_g: self.protein_g,
            fat_g: self.fat_g,
            carb_g: self.carb_g,
            description: self.description.trim().to_string(),
            memo: self.memo.filter(|m| !m.trim().is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

/// POST /meals/analyze/base64
#[derive(Debug, Deserialize)]
pub struct AnalyzePhotoBase64 {
    pub image_b64: String,
    pub content_type: Option<String>,
}

/// Vision model estimate used to prefill a meal form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPhotoAnalysis {
    pub description: String,
    pub calories: f64,
}
