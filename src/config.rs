use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    /// Fallback credential when settings carry none.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub advice_max_tokens: u32,
    pub photo_max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub openai: OpenAiConfig,
    pub default_daily_calorie_goal: f64,
    pub default_monthly_saving_goal: f64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let openai = OpenAiConfig {
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".into()),
            advice_max_tokens: env_or("ADVICE_MAX_TOKENS", 500),
            photo_max_tokens: env_or("PHOTO_MAX_TOKENS", 300),
            timeout_secs: env_or("OPENAI_TIMEOUT_SECS", 60),
        };
        Ok(Self {
            database_url,
            openai,
            default_daily_calorie_goal: env_or("DEFAULT_DAILY_CALORIE_GOAL", 2000.0),
            default_monthly_saving_goal: env_or("DEFAULT_MONTHLY_SAVING_GOAL", 7200.0),
        })
    }
}
