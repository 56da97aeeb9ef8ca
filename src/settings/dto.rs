use serde::Deserialize;

/// PUT /settings. Absent fields keep their value; an empty key clears it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSettingsRequest {
    pub openai_api_key: Option<String>,
    pub daily_calorie_goal: Option<f64>,
    pub monthly_saving_goal: Option<f64>,
}
