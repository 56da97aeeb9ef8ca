use tracing::info;

use super::dto::UpdateSettingsRequest;
use super::repo_types::Settings;
use crate::error::{DiaryError, DiaryResult};
use crate::meals::dto::ensure_amount;
use crate::state::AppState;

/// Stored settings, or the configured defaults before the first save.
pub async fn current_settings(st: &AppState) -> DiaryResult<Settings> {
    Ok(st.settings.load().await?.unwrap_or_else(|| Settings {
        openai_api_key: None,
        daily_calorie_goal: st.config.default_daily_calorie_goal,
        monthly_saving_goal: st.config.default_monthly_saving_goal,
    }))
}

pub async fn update_settings(st: &AppState, req: UpdateSettingsRequest) -> DiaryResult<Settings> {
    let mut settings = current_settings(st).await?;
    if let Some(key) = req.openai_api_key {
        let key = key.trim();
        settings.openai_api_key = (!key.is_empty()).then(|| key.to_string());
    }
    if let Some(goal) = req.daily_calorie_goal {
        ensure_amount("daily_calorie_goal", goal)?;
        settings.daily_calorie_goal = goal;
    }
    if let Some(goal) = req.monthly_saving_goal {
        ensure_amount("monthly_saving_goal", goal)?;
        settings.monthly_saving_goal = goal;
    }
    let saved = st.settings.save(settings).await?;
    info!(
        has_key = saved.openai_api_key.is_some(),
        daily_goal = saved.daily_calorie_goal,
        "settings updated"
    );
    Ok(saved)
}

/// Settings credential first, then the server one. Checked before any network call.
pub async fn resolve_api_key(st: &AppState) -> DiaryResult<String> {
    current_settings(st)
        .await?
        .openai_api_key
        .or_else(|| st.config.openai.api_key.clone())
        .ok_or(DiaryError::CredentialMissing)
}

#[cfg(test)]
mod settings_service_tests {
    use super::*;

    #[tokio::test]
    async fn defaults_before_first_save() {
        let st = AppState::fake();
        let s = current_settings(&st).await.unwrap();
        assert_eq!(s.daily_calorie_goal, st.config.default_daily_calorie_goal);
        assert!(s.openai_api_key.is_none());
    }

    #[tokio::test]
    async fn missing_credential_fails_fast() {
        let st = AppState::fake();
        assert!(matches!(
            resolve_api_key(&st).await,
            Err(DiaryError::CredentialMissing)
        ));
    }

    #[tokio::test]
    async fn stored_key_wins_and_empty_clears() {
        let st = AppState::fake();
        update_settings(
            &st,
            UpdateSettingsRequest {
                openai_api_key: Some(" sk-user ".into()),
                daily_calorie_goal: Some(1800.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(resolve_api_key(&st).await.unwrap(), "sk-user");
        assert_eq!(current_settings(&st).await.unwrap().daily_calorie_goal, 1800.0);

        update_settings(
            &st,
            UpdateSettingsRequest {
                openai_api_key: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(resolve_api_key(&st).await.is_err());
    }

    #[tokio::test]
    async fn rejects_negative_goal() {
        let st = AppState::fake();
        let err = update_settings(
            &st,
            UpdateSettingsRequest {
                daily_calorie_goal: Some(-1.0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DiaryError::BadRequest(_)));
    }
}
