//! Event status and state endpoints.

use axum::extract::{Path, State};
use axum::Json;
use livescore_tracker::Event;
use serde::Deserialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Body of a status update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    /// Event id.
    pub event_id: String,
    /// True for LIVE, false for NOT_LIVE.
    pub live: bool,
}

/// Marks an event LIVE or NOT_LIVE and (un)schedules its polling.
pub async fn update_status(
    State(state): State<AppState>,
    Json(request): Json<StatusUpdateRequest>,
) -> ApiResult<Json<Event>> {
    if request.event_id.trim().is_empty() {
        return Err(ApiError::BadRequest("Event ID is required".to_string()));
    }

    let event_id = request.event_id.as_str();
    info!(event_id, live = request.live, "Received event status update");
    let event = state.tracker.update_status(event_id, request.live).await;
    Ok(Json(event))
}

/// Returns the current state of an event.
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> ApiResult<Json<Event>> {
    state
        .tracker
        .get_event(&event_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Event not found: {event_id}")))
}
