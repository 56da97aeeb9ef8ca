use serde::{Deserialize, Serialize};

use super::provider::WorkoutSample;
use super::repo_types::HealthSample;
use crate::error::{DiaryError, DiaryResult};

/// POST /health/samples
#[derive(Debug, Default, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub samples: Vec<HealthSample>,
    #[serde(default)]
    pub workouts: Vec<WorkoutSample>,
}

impl IngestRequest {
    pub fn validate(&self) -> DiaryResult<()> {
        for s in &self.samples {
            s.validate()?;
        }
        for w in &self.workouts {
            if w.external_id.trim().is_empty() {
                return Err(DiaryError::bad_request("workout external_id is required"));
            }
            if w.end < w.start || !w.calories.is_finite() || w.calories < 0.0 {
                return Err(DiaryError::bad_request(format!(
                    "workout {} has an invalid time range or calories",
                    w.external_id
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub samples: usize,
    pub workouts: usize,
}
