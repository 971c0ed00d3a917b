//! HTTP routes.

pub mod events;
pub mod health;
pub mod mock;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/metrics", get(health::metrics))
        .route("/api/events/status", post(events::update_status))
        .route("/api/events/{event_id}", get(events::get_event))
        .route("/api/mock/events/{event_id}", get(mock::get_event_score))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
