//! HTTP surface tests: health check and the call intake webhook.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;
use voicebridge::{AppState, ServerConfig, routes};

fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 5050,
        openai_api_key: "sk-test".to_string(),
        model: "gpt-4o-realtime-preview".to_string(),
        voice: "alloy".to_string(),
        instructions: "Sé breve.".to_string(),
        temperature: 0.8,
        lookup_service_url: None,
        greet_first: false,
        enabled_tools: Vec::new(),
        log_event_types: Vec::new(),
    }
}

fn app() -> Router {
    routes::create_router().with_state(AppState::new(test_config()))
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "voicebridge");
}

#[tokio::test]
async fn incoming_call_returns_twiml_with_stream_url() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/incoming-call")
                .header(header::HOST, "bridge.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("text/xml")
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let twiml = String::from_utf8(body.to_vec()).unwrap();
    assert!(twiml.contains("wss://bridge.example.com/media-stream"));
    assert!(twiml.contains("<Connect>"));
}

#[tokio::test]
async fn incoming_call_accepts_get() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/incoming-call")
                .header(header::HOST, "localhost:5050")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
