use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use super::repo_types::Settings;
use crate::error::DiaryResult;

#[async_trait]
pub trait SettingsRepo: Send + Sync {
    /// `None` until the first save.
    async fn load(&self) -> DiaryResult<Option<Settings>>;
    async fn save(&self, settings: Settings) -> DiaryResult<Settings>;
}

#[derive(Clone)]
pub struct PgSettingsRepo {
    db: PgPool,
}

impl PgSettingsRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SettingsRepo for PgSettingsRepo {
    async fn load(&self) -> DiaryResult<Option<Settings>> {
        let row = sqlx::query_as::<_, Settings>(
            r#"
            SELECT openai_api_key, daily_calorie_goal, monthly_saving_goal
              FROM settings
             WHERE id = 1
            "#,
        )
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn save(&self, settings: Settings) -> DiaryResult<Settings> {
        let row = sqlx::query_as::<_, Settings>(
            r#"
            INSERT INTO settings (id, openai_api_key, daily_calorie_goal, monthly_saving_goal)
            VALUES (1, $1, $2, $3)
            ON CONFLICT (id) DO UPDATE
               SET openai_api_key = EXCLUDED.openai_api_key,
                   daily_calorie_goal = EXCLUDED.daily_calorie_goal,
                   monthly_saving_goal = EXCLUDED.monthly_saving_goal,
                   updated_at = now()
            RETURNING openai_api_key, daily_calorie_goal, monthly_saving_goal
            "#,
        )
        .bind(&settings.openai_api_key)
        .bind(settings.daily_calorie_goal)
        .bind(settings.monthly_saving_goal)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }
}

#[derive(Default)]
pub struct InMemorySettingsRepo {
    slot: RwLock<Option<Settings>>,
}

#[async_trait]
impl SettingsRepo for InMemorySettingsRepo {
    async fn load(&self) -> DiaryResult<Option<Settings>> {
        Ok(self.slot.read().await.clone())
    }

    async fn save(&self, settings: Settings) -> DiaryResult<Settings> {
        *self.slot.write().await = Some(settings.clone());
        Ok(settings)
    }
}
