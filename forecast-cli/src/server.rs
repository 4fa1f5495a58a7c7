//! HTTP surface: `POST /forecast` plus a health probe.

use std::{any::Any, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use forecast_core::{
    ErrorBody, ForecastEnvelope, ForecastError, ForecastRequest, ForecastService,
    forecast::INTERNAL_ERROR_MESSAGE,
};
use serde_json::{Value, json};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ForecastService>,
}

/// Maps a handler failure onto its status code and `{"error": ...}` body.
pub struct ApiError(ForecastError);

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.0.public_message() };
        (self.0.status_code(), Json(body)).into_response()
    }
}

/// POST /forecast - Five-day forecast for `location`
async fn forecast(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ForecastEnvelope>, ApiError> {
    let request = ForecastRequest::from_body(&body);
    let result = state.service.forecast(&request).await?;
    Ok(Json(ForecastEnvelope { result }))
}

/// GET /health - Health check endpoint
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(%detail, "request handler panicked");

    let body = ErrorBody { error: INTERNAL_ERROR_MESSAGE.to_string() };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

/// Create the HTTP router
pub fn create_router(service: Arc<ForecastService>) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/health", get(health_check))
        .route("/forecast", post(forecast))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until Ctrl-C.
pub async fn run_http_server(service: Arc<ForecastService>, port: u16) -> anyhow::Result<()> {
    let app = create_router(service);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    tracing::info!("Server is running on http://localhost:{port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl-C, shutting down gracefully...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use forecast_core::{
        CompletionProvider, CompletionRequest, ForecastSettings, ProviderError,
        provider::openai::OpenAiProvider,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const AUSTIN: &str = r#"{"day1":"Sunny skies!","day2":"Clouds roll in","day3":"Rain delay!","day4":"Clearing up","day5":"Championship weather"}"#;

    fn completion(content: Value) -> Value {
        json!({
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": content } }
            ]
        })
    }

    fn app_for(server: &MockServer) -> Router {
        let provider = OpenAiProvider::new("sk-test".into()).with_base_url(&server.uri());
        create_router(Arc::new(ForecastService::new(
            Arc::new(provider),
            ForecastSettings::default(),
        )))
    }

    /// Mounts a chat completion answer that must be requested `calls` times.
    async fn openai_answering(content: Value, calls: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(content)))
            .expect(calls)
            .mount(&server)
            .await;
        server
    }

    async fn post_forecast(app: Router, body: &'static str) -> (StatusCode, String) {
        let req = Request::builder()
            .method("POST")
            .uri("/forecast")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();

        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn austin_round_trip() {
        let server = openai_answering(json!(AUSTIN), 1).await;

        let (status, body) = post_forecast(app_for(&server), r#"{"location":"Austin"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            r#"{"result":{"day1":"Sunny skies!","day2":"Clouds roll in","day3":"Rain delay!","day4":"Clearing up","day5":"Championship weather"}}"#
        );
    }

    #[tokio::test]
    async fn prompt_carries_the_exact_location() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("forecast for Reykjavík, Iceland in the style"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!(AUSTIN))))
            .expect(1)
            .mount(&server)
            .await;

        let (status, _) =
            post_forecast(app_for(&server), r#"{"location":"Reykjavík, Iceland"}"#).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_location_is_400_without_upstream_call() {
        let server = openai_answering(json!(AUSTIN), 0).await;

        for body in ["{}", r#"{"location":""}"#, r#"{"location":null}"#, "", "not json"] {
            let (status, text) = post_forecast(app_for(&server), body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body:?}");
            assert_eq!(text, r#"{"error":"Please provide a location in the request body."}"#);
        }
    }

    #[tokio::test]
    async fn provider_shape_is_not_validated() {
        let server = openai_answering(json!(r#"{"day1":"Lone day","extra":[1,2]}"#), 1).await;

        let (status, body) = post_forecast(app_for(&server), r#"{"location":"Lima"}"#).await;

        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value, json!({ "result": { "day1": "Lone day", "extra": [1, 2] } }));
    }

    #[tokio::test]
    async fn provider_key_order_is_kept() {
        let server =
            openai_answering(json!(r#"{"day5":"E","day1":"A","zeta":"z","alpha":"a"}"#), 1).await;

        let (status, body) = post_forecast(app_for(&server), r#"{"location":"Lima"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"result":{"day5":"E","day1":"A","zeta":"z","alpha":"a"}}"#);
    }

    #[tokio::test]
    async fn empty_completion_is_500() {
        let server = openai_answering(Value::Null, 1).await;

        let (status, body) = post_forecast(app_for(&server), r#"{"location":"Austin"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"error":"No response from OpenAI."}"#);
    }

    #[tokio::test]
    async fn non_json_completion_is_500_and_hidden() {
        let server = openai_answering(json!("Play ball! It's gonna be a scorcher."), 1).await;

        let (status, body) = post_forecast(app_for(&server), r#"{"location":"Austin"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"error":"Failed to parse forecast data."}"#);
        assert!(!body.contains("scorcher"));
    }

    #[tokio::test]
    async fn upstream_failure_surfaces_its_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "message": "Rate limit reached for gpt-4" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (status, body) = post_forecast(app_for(&server), r#"{"location":"Austin"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let value: Value = serde_json::from_str(&body).unwrap();
        let message = value["error"].as_str().unwrap();
        assert!(message.contains("Rate limit reached for gpt-4"), "{message}");
    }

    #[derive(Debug)]
    struct PanickingProvider;

    #[async_trait]
    impl CompletionProvider for PanickingProvider {
        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<Option<String>, ProviderError> {
            panic!("provider blew up");
        }
    }

    #[tokio::test]
    async fn panic_becomes_generic_500() {
        let app = create_router(Arc::new(ForecastService::new(
            Arc::new(PanickingProvider),
            ForecastSettings::default(),
        )));

        let (status, body) = post_forecast(app, r#"{"location":"Austin"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"error":"Internal Server Error"}"#);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let server = openai_answering(json!(AUSTIN), 0).await;
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let res = app_for(&server).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], br#"{"status":"ok"}"#);
    }
}
