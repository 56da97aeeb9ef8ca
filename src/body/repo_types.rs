use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::DiaryResult;
use crate::meals::dto::ensure_amount;
use crate::memory::Keyed;

/// Body metrics are append-only. The latest `recorded_at` for a date wins on read.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct BodyRecord {
    pub id: Uuid,
    #[serde(with = "crate::dates::iso_date")]
    pub date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
    pub weight_kg: f64,
    pub body_fat_percentage: Option<f64>,
}

impl Keyed for BodyRecord {
    fn key(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Deserialize)]
pub struct BodyRequest {
    #[serde(with = "crate::dates::iso_date")]
    pub date: Date,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub recorded_at: Option<OffsetDateTime>,
    pub weight_kg: f64,
    pub body_fat_percentage: Option<f64>,
}

impl BodyRequest {
    pub fn into_record(self) -> DiaryResult<BodyRecord> {
        ensure_amount("weight_kg", self.weight_kg)?;
        if let Some(pct) = self.body_fat_percentage {
            ensure_amount("body_fat_percentage", pct)?;
            if pct > 100.0 {
                return Err(crate::error::DiaryError::bad_request(
                    "body_fat_percentage must be at most 100",
                ));
            }
        }
        Ok(BodyRecord {
            id: Uuid::new_v4(),
            date: self.date,
            recorded_at: self.recorded_at.unwrap_or_else(OffsetDateTime::now_utc),
            weight_kg: self.weight_kg,
            body_fat_percentage: self.body_fat_percentage,
        })
    }
}
