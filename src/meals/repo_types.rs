use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::DiaryError;
use crate::memory::Keyed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }
}

impl std::str::FromStr for MealType {
    type Err = DiaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            "snack" => Ok(Self::Snack),
            other => Err(DiaryError::bad_request(format!("unknown meal type '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealRecord {
    pub id: Uuid,
    #[serde(with = "crate::dates::iso_date")]
    pub date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
    pub meal_type: MealType,
    pub calories: f64,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub carb_g: Option<f64>,
    pub description: String,
    pub memo: Option<String>,
}

impl Keyed for MealRecord {
    fn key(&self) -> Uuid {
        self.id
    }
}

/// Validated input for creating or editing a meal.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeal {
    pub date: Date,
    pub recorded_at: OffsetDateTime,
    pub meal_type: MealType,
    pub calories: f64,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub carb_g: Option<f64>,
    pub description: String,
    pub memo: Option<String>,
}

impl NewMeal {
    pub fn into_record(self, id: Uuid) -> MealRecord {
        MealRecord {
            id,
            date: self.date,
            recorded_at: self.recorded_at,
            meal_type: self.meal_type,
            calories: self.calories,
            protein_g: self.protein_g,
            fat_g: self.fat_g,
            carb_g: self.carb_g,
            description: self.description,
            memo: self.memo,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct MealRow {
    pub id: Uuid,
    pub date: Date,
    pub recorded_at: OffsetDateTime,
    pub meal_type: String,
    pub calories: f64,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub carb_g: Option<f64>,
    pub description: String,
    pub memo: Option<String>,
}

impl TryFrom<MealRow> for MealRecord {
    type Error = DiaryError;

    fn try_from(r: MealRow) -> Result<Self, Self::Error> {
        let meal_type = r
            .meal_type
            .parse()
            .map_err(|_| DiaryError::Internal(format!("stored meal_type '{}'", r.meal_type)))?;
        Ok(Self {
            id: r.id,
            date: r.date,
            recorded_at: r.recorded_at,
            meal_type,
            calories: r.calories,
            protein_g: r.protein_g,
            fat_g: r.fat_g,
            carb_g: r.carb_g,
            description: r.description,
            memo: r.memo,
        })
    }
}
