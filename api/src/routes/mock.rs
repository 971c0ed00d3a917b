//! Mock external score API.

use axum::extract::{Path, State};
use axum::Json;
use livescore_tracker::ScoreResult;
use tracing::debug;

use crate::state::AppState;

/// Returns the simulated score of an event.
pub async fn get_event_score(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Json<ScoreResult> {
    debug!(event_id = %event_id, "Mock API received request");
    Json(state.mock.next_score(&event_id))
}
