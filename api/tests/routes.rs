//! Route behavior over an in-memory polling core.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use livescore_api::{router, AppState, MockScoreApi};
use livescore_tracker::{assemble, HttpScoreSource, LiveEventTracker, LoggingBus, TrackerConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app() -> (Router, LiveEventTracker) {
    let config = TrackerConfig::default();
    let source = Arc::new(HttpScoreSource::new(&config).expect("source"));
    let components = assemble(&config, source, Arc::new(LoggingBus::new()));
    let tracker = components.tracker.clone();
    let state =
        AppState::new(components.tracker, components.metrics).with_mock(MockScoreApi::new(0.0));
    (router(state), tracker)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_status_update_live_schedules_polling() {
    let (app, tracker) = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/events/status",
        Some(json!({ "eventId": "E1", "live": true })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["eventId"], "E1");
    assert_eq!(body["status"], "LIVE");
    assert!(body["currentScore"].is_null());
    assert!(tracker.is_scheduled("E1").await);
}

#[tokio::test]
async fn test_status_update_not_live_unschedules() {
    let (app, tracker) = test_app();
    tracker.update_status("E2", true).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/events/status",
        Some(json!({ "eventId": "E2", "live": false })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "NOT_LIVE");
    assert!(!tracker.is_scheduled("E2").await);
}

#[tokio::test]
async fn test_status_update_blank_id_rejected() {
    let (app, tracker) = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/events/status",
        Some(json!({ "eventId": "  ", "live": true })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(tracker.active_events().await.is_empty());
}

#[tokio::test]
async fn test_status_update_missing_live_rejected() {
    let (app, _) = test_app();

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/events/status",
        Some(json!({ "eventId": "E3" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_get_event() {
    let (app, tracker) = test_app();
    tracker.update_status("E4", true).await;

    let (status, body) = send(&app, Method::GET, "/api/events/E4", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["eventId"], "E4");
    assert_eq!(body["status"], "LIVE");
    assert!(body["lastUpdated"].is_string());

    let (status, body) = send(&app, Method::GET, "/api/events/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_metrics() {
    let (app, tracker) = test_app();
    tracker.update_status("E5", true).await;
    tracker.update_status("E6", false).await;

    let (status, body) = send(&app, Method::GET, "/api/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["activeEvents"], 1);
    assert_eq!(body["trackedEvents"], 2);
    assert_eq!(body["ticks"], 0);
    assert_eq!(body["schedulerRunning"], false);
}

#[tokio::test]
async fn test_mock_score_api() {
    let (app, _) = test_app();

    let (status, body) = send(&app, Method::GET, "/api/mock/events/E7", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "eventId": "E7", "currentScore": "0:0" }));
}
