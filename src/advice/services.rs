use base64ct::{Base64, Encoding};
use time::{Date, OffsetDateTime};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::client::{CompletionRequest, ImageAttachment};
use super::dto::{AdviceRecord, PhotoAdviceRequest};
use super::parse::parse_reply;
use super::prompt::{
    daily_advice_prompt, photo_advice_prompt, ADVICE_SYSTEM_PROMPT, PHOTO_ADVICE_SYSTEM_PROMPT,
};
use crate::dates::parse_date;
use crate::error::{DiaryError, DiaryResult};
use crate::settings::services::resolve_api_key;
use crate::state::AppState;
use crate::summary::services::build_daily_summary;

pub const DEFAULT_IMAGE_TYPE: &str = "image/jpeg";

/// Checks the payload is real base64 and the content type is an image.
pub fn image_attachment(image_b64: &str, content_type: Option<&str>) -> DiaryResult<ImageAttachment> {
    let b64 = image_b64.trim();
    let bytes = Base64::decode_vec(b64)
        .map_err(|_| DiaryError::bad_request("image is not valid base64"))?;
    if bytes.is_empty() {
        return Err(DiaryError::bad_request("image is empty"));
    }
    let content_type = content_type.unwrap_or(DEFAULT_IMAGE_TYPE).trim();
    if !content_type.starts_with("image/") {
        return Err(DiaryError::bad_request(format!(
            "unsupported content type '{content_type}'"
        )));
    }
    Ok(ImageAttachment {
        content_type: content_type.to_string(),
        base64: b64.to_string(),
    })
}

async fn complete_and_cache(
    st: &AppState,
    api_key: &str,
    date: Date,
    request: CompletionRequest,
) -> DiaryResult<AdviceRecord> {
    let ticket = st.generations.begin();
    let reply = st.completions.complete(api_key, &request).await?;
    let record = AdviceRecord {
        id: Uuid::new_v4(),
        date,
        generated_at: OffsetDateTime::now_utc(),
        result: parse_reply(&reply),
    };

    match st.generations.publish(ticket, st.advice.save(record.clone())).await {
        Some(saved) => {
            saved?;
            info!(
                advice_id = %record.id,
                with_analysis = record.result.meal_analysis.is_some(),
                "advice generated"
            );
        }
        None => {
            debug!(advice_id = %record.id, "newer advice request started; cache left untouched");
        }
    }
    Ok(record)
}

#[instrument(skip(st))]
pub async fn request_advice(st: &AppState, date: Date, today: Date) -> DiaryResult<AdviceRecord> {
    let api_key = resolve_api_key(st).await?;
    let summary = build_daily_summary(st, date, today).await?;
    let request = CompletionRequest {
        system: ADVICE_SYSTEM_PROMPT.to_string(),
        text: daily_advice_prompt(&summary),
        image: None,
        max_tokens: st.config.openai.advice_max_tokens,
    };
    complete_and_cache(st, &api_key, date, request).await
}

#[instrument(skip(st, req), fields(meal_type = req.meal_type.as_str()))]
pub async fn request_photo_advice(
    st: &AppState,
    req: PhotoAdviceRequest,
    today: Date,
) -> DiaryResult<AdviceRecord> {
    let api_key = resolve_api_key(st).await?;
    let date = match req.date.as_deref() {
        Some(d) => parse_date(d)?,
        None => today,
    };
    let image = image_attachment(&req.image_b64, req.content_type.as_deref())?;
    let summary = build_daily_summary(st, date, today).await?;
    let request = CompletionRequest {
        system: PHOTO_ADVICE_SYSTEM_PROMPT.to_string(),
        text: photo_advice_prompt(&summary, req.meal_type),
        image: Some(image),
        max_tokens: st.config.openai.advice_max_tokens,
    };
    complete_and_cache(st, &api_key, date, request).await
}

#[cfg(test)]
mod advice_service_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use time::macros::date;
    use tokio::sync::Notify;

    use super::*;
    use crate::advice::client::CompletionClient;
    use crate::meals::repo_types::MealType;
    use crate::settings::dto::UpdateSettingsRequest;
    use crate::settings::services::update_settings;

    const DAY: Date = date!(2024 - 04 - 26);

    async fn with_key(st: &AppState) {
        update_settings(
            st,
            UpdateSettingsRequest {
                openai_api_key: Some("sk-test".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn missing_credential_fails_before_any_call() {
        let (st, fakes) = AppState::fake_with_handles();
        let err = request_advice(&st, DAY, DAY).await.unwrap_err();
        assert!(matches!(err, DiaryError::CredentialMissing));
        assert!(fakes.completions.requests().is_empty());
        assert!(st.advice.last().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn text_advice_is_cached() {
        let (st, fakes) = AppState::fake_with_handles();
        with_key(&st).await;
        fakes
            .completions
            .push_reply(Ok("Eat more vegetables at dinner.".into()));

        let rec = request_advice(&st, DAY, DAY).await.unwrap();
        assert_eq!(rec.result.advice, "Eat more vegetables at dinner.");
        assert!(rec.result.meal_analysis.is_none());

        let sent = fakes.completions.requests();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].image.is_none());
        assert!(sent[0].text.contains("2024-04-26"));
        assert_eq!(sent[0].max_tokens, st.config.openai.advice_max_tokens);

        assert_eq!(st.advice.last().await.unwrap(), Some(rec));
    }

    #[tokio::test]
    async fn upstream_error_leaves_cache_alone() {
        let (st, fakes) = AppState::fake_with_handles();
        with_key(&st).await;
        fakes
            .completions
            .push_reply(Err(DiaryError::Upstream("rate limited".into())));

        let err = request_advice(&st, DAY, DAY).await.unwrap_err();
        assert!(matches!(err, DiaryError::Upstream(_)));
        assert!(st.advice.last().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn photo_advice_extracts_analysis() {
        let (st, fakes) = AppState::fake_with_handles();
        with_key(&st).await;
        fakes.completions.push_reply(Ok(
            "{\"estimatedCalories\": 650, \"proteinGrams\": 28, \"fatGrams\": 35, \"carbGrams\": 45}\nToo much fat."
                .into(),
        ));

        let rec = request_photo_advice(
            &st,
            PhotoAdviceRequest {
                date: Some("2024-04-26".into()),
                meal_type: MealType::Lunch,
                image_b64: "aGVsbG8=".into(),
                content_type: Some("image/png".into()),
            },
            DAY,
        )
        .await
        .unwrap();

        assert_eq!(rec.result.advice, "Too much fat.");
        assert_eq!(
            rec.result.meal_analysis.map(|a| a.estimated_calories),
            Some(650.0)
        );
        let sent = fakes.completions.requests();
        let image = sent[0].image.clone().unwrap();
        assert_eq!(image.data_url(), "data:image/png;base64,aGVsbG8=");
        assert!(sent[0].text.starts_with("Analyse this lunch photo."));
    }

    #[tokio::test]
    async fn photo_advice_rejects_bad_base64() {
        let (st, fakes) = AppState::fake_with_handles();
        with_key(&st).await;
        let err = request_photo_advice(
            &st,
            PhotoAdviceRequest {
                date: None,
                meal_type: MealType::Snack,
                image_b64: "not base64!!".into(),
                content_type: None,
            },
            DAY,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DiaryError::BadRequest(_)));
        assert!(fakes.completions.requests().is_empty());
    }

    /// Holds the first completion until released; later calls answer at once.
    #[derive(Default)]
    struct GatedClient {
        calls: AtomicUsize,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl CompletionClient for GatedClient {
        async fn complete(&self, _: &str, _: &CompletionRequest) -> DiaryResult<String> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.entered.notify_one();
                self.release.notified().await;
                return Ok("older advice".into());
            }
            Ok("newer advice".into())
        }
    }

    async fn overtaken_by_newer(older_date: Date, newer_date: Date) {
        let mut st = AppState::fake();
        with_key(&st).await;
        let gate = Arc::new(GatedClient::default());
        st.completions = gate.clone() as Arc<dyn CompletionClient>;

        let older = tokio::spawn({
            let st = st.clone();
            async move { request_advice(&st, older_date, DAY).await }
        });
        gate.entered.notified().await;

        let newer = request_advice(&st, newer_date, DAY).await.unwrap();
        assert_eq!(newer.result.advice, "newer advice");
        gate.release.notify_one();

        let older = older.await.unwrap().unwrap();
        assert_eq!(older.result.advice, "older advice");

        let last = st.advice.last().await.unwrap().unwrap();
        assert_eq!(last.id, newer.id);
        assert_eq!(last.date, newer_date);
    }

    #[tokio::test]
    async fn superseded_request_does_not_overwrite_cache() {
        overtaken_by_newer(DAY, DAY).await;
    }

    #[tokio::test]
    async fn superseded_request_for_other_date_does_not_overwrite_cache() {
        overtaken_by_newer(date!(2024 - 04 - 25), DAY).await;
    }
}
