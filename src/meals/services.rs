use tracing::{info, instrument};

use super::dto::MealPhotoAnalysis;
use crate::advice::client::{CompletionRequest, ImageAttachment};
use crate::advice::parse::parse_meal_photo;
use crate::advice::prompt::{MEAL_PHOTO_SYSTEM_PROMPT, MEAL_PHOTO_USER_PROMPT};
use crate::error::DiaryResult;
use crate::settings::services::resolve_api_key;
use crate::state::AppState;

/// Asks the vision model for a description and calorie estimate to prefill a meal.
/// Nothing is stored.
#[instrument(skip(st, image), fields(content_type = %image.content_type))]
pub async fn analyze_meal_photo(
    st: &AppState,
    image: ImageAttachment,
) -> DiaryResult<MealPhotoAnalysis> {
    let api_key = resolve_api_key(st).await?;
    let request = CompletionRequest {
        system: MEAL_PHOTO_SYSTEM_PROMPT.to_string(),
        text: MEAL_PHOTO_USER_PROMPT.to_string(),
        image: Some(image),
        max_tokens: st.config.openai.photo_max_tokens,
    };
    let reply = st.completions.complete(&api_key, &request).await?;
    let analysis = parse_meal_photo(&reply)?;
    info!(calories = analysis.calories, "meal photo analysed");
    Ok(analysis)
}

#[cfg(test)]
mod meal_service_tests {
    use super::*;
    use crate::error::DiaryError;
    use crate::settings::dto::UpdateSettingsRequest;
    use crate::settings::services::update_settings;

    fn photo() -> ImageAttachment {
        ImageAttachment {
            content_type: "image/jpeg".into(),
            base64: "aGVsbG8=".into(),
        }
    }

    #[tokio::test]
    async fn analysis_uses_photo_token_budget() {
        let (st, fakes) = AppState::fake_with_handles();
        update_settings(
            &st,
            UpdateSettingsRequest {
                openai_api_key: Some("sk-test".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        fakes
            .completions
            .push_reply(Ok(r#"{"description": "salmon rice bowl", "calories": 620}"#.into()));

        let a = analyze_meal_photo(&st, photo()).await.unwrap();
        assert_eq!(
            a,
            MealPhotoAnalysis {
                description: "salmon rice bowl".into(),
                calories: 620.0,
            }
        );
        let sent = fakes.completions.requests();
        assert_eq!(sent[0].max_tokens, st.config.openai.photo_max_tokens);
        assert_eq!(sent[0].image, Some(photo()));
        assert_eq!(st.meals.list_by_date(crate::dates::today_utc()).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn analysis_requires_credential() {
        let (st, fakes) = AppState::fake_with_handles();
        let err = analyze_meal_photo(&st, photo()).await.unwrap_err();
        assert!(matches!(err, DiaryError::CredentialMissing));
        assert!(fakes.completions.requests().is_empty());
    }

    #[tokio::test]
    async fn unparseable_reply_is_upstream_error() {
        let (st, fakes) = AppState::fake_with_handles();
        update_settings(
            &st,
            UpdateSettingsRequest {
                openai_api_key: Some("sk-test".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        fakes.completions.push_reply(Ok("Looks like pasta!".into()));
        let err = analyze_meal_photo(&st, photo()).await.unwrap_err();
        assert!(matches!(err, DiaryError::Upstream(_)));
    }
}
