use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub daily_calorie_goal: f64,
    pub monthly_saving_goal: f64,
}

/// What clients get back: the credential never leaves the server.
#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub has_openai_api_key: bool,
    pub openai_api_key_hint: Option<String>,
    pub daily_calorie_goal: f64,
    pub monthly_saving_goal: f64,
}

/// Last four characters only, and nothing at all for short keys.
fn mask_key(key: &str) -> String {
    if key.chars().count() <= 8 {
        return "…".to_string();
    }
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("…{tail}")
}

impl From<&Settings> for SettingsView {
    fn from(s: &Settings) -> Self {
        Self {
            has_openai_api_key: s.openai_api_key.is_some(),
            openai_api_key_hint: s.openai_api_key.as_deref().map(mask_key),
            daily_calorie_goal: s.daily_calorie_goal,
            monthly_saving_goal: s.monthly_saving_goal,
        }
    }
}
