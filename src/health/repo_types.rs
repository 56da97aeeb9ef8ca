use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::DiaryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    ActiveEnergy,
    BasalEnergy,
    DietaryEnergy,
    Protein,
    Fat,
    Carbs,
    Steps,
}

impl SampleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ActiveEnergy => "active_energy",
            Self::BasalEnergy => "basal_energy",
            Self::DietaryEnergy => "dietary_energy",
            Self::Protein => "protein",
            Self::Fat => "fat",
            Self::Carbs => "carbs",
            Self::Steps => "steps",
        }
    }
}

/// One quantity sample pushed by the device. `(kind, start, end)` identifies it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSample {
    pub kind: SampleKind,
    pub value: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
}

impl HealthSample {
    pub fn validate(&self) -> Result<(), DiaryError> {
        if !self.value.is_finite() || self.value < 0.0 {
            return Err(DiaryError::bad_request(format!(
                "{} sample value must be a non-negative number",
                self.kind.as_str()
            )));
        }
        if self.end < self.start {
            return Err(DiaryError::bad_request("sample end precedes start"));
        }
        Ok(())
    }
}
