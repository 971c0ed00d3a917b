//! Liveness and metrics endpoints.

use axum::extract::State;
use axum::Json;
use livescore_tracker::TrackerMetricsSnapshot;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok` while the server answers.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
}

/// Returns OK if the server is running.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Metrics response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    /// Polling counters.
    #[serde(flatten)]
    pub polling: TrackerMetricsSnapshot,
    /// Ids in the active set.
    pub active_events: usize,
    /// Events known to the store.
    pub tracked_events: usize,
    /// Whether the polling loop is running.
    pub scheduler_running: bool,
}

/// Returns the polling metrics.
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    let scheduler = state.tracker.scheduler();
    Json(MetricsResponse {
        polling: state.metrics.snapshot(),
        active_events: state.tracker.active_events().await.len(),
        tracked_events: state.tracker.store().len().await,
        scheduler_running: scheduler.is_running(),
    })
}
