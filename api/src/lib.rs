//! Livescore API Server.
//!
//! HTTP front of the polling core: clients report event status changes and
//! read event state here, and a mock external score API is served for local
//! runs.
//!
//! # Endpoints
//!
//! - `POST /api/events/status`: Mark an event LIVE or NOT_LIVE
//! - `GET /api/events/{eventId}`: Current state of an event
//! - `GET /api/metrics`: Polling metrics
//! - `GET /api/mock/events/{eventId}`: Mock external score API
//! - `GET /health`: Liveness check

pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use server::{shutdown_signal, Server, ServerConfig, ServerError};
pub use state::{AppState, MockScoreApi};
