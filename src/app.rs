use std::net::SocketAddr;
use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::state::AppState;
use crate::{advice, body, health, meals, settings, summary, workouts};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1",
              Router::new()
                  .merge(meals::router())
                  .merge(workouts::router())
                  .merge(body::router())
                  .merge(summary::router())
                  .merge(advice::router())
                  .merge(settings::router())
                  .merge(health::router())
                  .route("/health", get(|| async { "ok" }))
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms = ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms = ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
        .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod router_tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    #[tokio::test]
    async fn liveness() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("ok".into()));
    }

    #[tokio::test]
    async fn meal_lifecycle_and_summary() {
        let app = build_app(AppState::fake());
        let (status, meal) = call(
            &app,
            "POST",
            "/api/v1/meals",
            Some(json!({"date": "2024-04-26", "meal_type": "lunch", "calories": 650, "description": "ramen"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = meal["id"].as_str().unwrap().to_string();

        call(
            &app,
            "POST",
            "/api/v1/workouts",
            Some(json!({"date": "2024-04-26", "activity_type": "run", "duration_minutes": 30, "calories": 300})),
        )
        .await;

        let (status, list) = call(&app, "GET", "/api/v1/meals?date=2024-04-26", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, summary) = call(&app, "GET", "/api/v1/summary/2024-04-26", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["total_intake_calories"], json!(650.0));
        assert_eq!(summary["net_calories"], json!(-350.0));
        assert_eq!(summary["calorie_goal"], json!(2000.0));

        let uri = format!("/api/v1/meals/{id}");
        let (status, _) = call(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_input_is_bad_request() {
        let app = build_app(AppState::fake());
        let (status, _) = call(&app, "GET", "/api/v1/summary/26-04-2024", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/meals",
            Some(json!({"date": "2024-04-26", "meal_type": "lunch", "calories": -5})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn last_representable_date_is_bad_request() {
        let app = build_app(AppState::fake());
        let (status, _) = call(&app, "GET", "/api/v1/health/daily/9999-12-31", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/workouts/sync",
            Some(json!({"date": "9999-12-31"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn advice_without_credential_is_precondition_failed() {
        let app = build_app(AppState::fake());
        let (status, _) = call(&app, "POST", "/api/v1/advice", Some(json!({"date": "2024-04-26"}))).await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        let (status, _) = call(&app, "GET", "/api/v1/advice/last", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn advice_roundtrip_through_settings() {
        let (state, fakes) = AppState::fake_with_handles();
        let app = build_app(state);
        let (status, settings) = call(
            &app,
            "PUT",
            "/api/v1/settings",
            Some(json!({"openai_api_key": "sk-abcdef123456"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(settings["has_openai_api_key"], json!(true));
        assert!(!settings.to_string().contains("sk-abcdef123456"));

        fakes.completions.push_reply(Ok("Sleep well tonight.".into()));
        let (status, advice) = call(&app, "POST", "/api/v1/advice", Some(json!({"date": "2024-04-26"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(advice["advice"], json!("Sleep well tonight."));

        let (status, last) = call(&app, "GET", "/api/v1/advice/last", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(last["id"], advice["id"]);
    }
}
