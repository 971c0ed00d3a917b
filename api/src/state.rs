//! Shared application state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use livescore_tracker::{LiveEventTracker, ScoreResult, TrackerMetrics};
use rand::Rng;
use tracing::debug;

/// Chance per request that the mock API adds a goal.
pub const DEFAULT_GOAL_PROBABILITY: f64 = 0.1;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Status-change entry point of the polling core.
    pub tracker: LiveEventTracker,
    /// Polling metrics.
    pub metrics: Arc<TrackerMetrics>,
    /// Mock external score API.
    pub mock: Arc<MockScoreApi>,
}

impl AppState {
    /// Creates the state over a wired tracker.
    #[must_use]
    pub fn new(tracker: LiveEventTracker, metrics: Arc<TrackerMetrics>) -> Self {
        Self {
            tracker,
            metrics,
            mock: Arc::new(MockScoreApi::default()),
        }
    }

    /// Replaces the mock score API.
    #[must_use]
    pub fn with_mock(mut self, mock: MockScoreApi) -> Self {
        self.mock = Arc::new(mock);
        self
    }
}

/// Simulated external score provider.
///
/// Every event starts at `0:0`. Each request may add a goal to a random side.
#[derive(Debug)]
pub struct MockScoreApi {
    scores: Mutex<HashMap<String, (u32, u32)>>,
    goal_probability: f64,
}

impl MockScoreApi {
    /// Creates a mock with the given goal probability, clamped to `[0, 1]`.
    #[must_use]
    pub fn new(goal_probability: f64) -> Self {
        let goal_probability = if goal_probability.is_nan() {
            0.0
        } else {
            goal_probability.clamp(0.0, 1.0)
        };
        Self {
            scores: Mutex::new(HashMap::new()),
            goal_probability,
        }
    }

    /// Returns the next score for an event.
    pub fn next_score(&self, event_id: &str) -> ScoreResult {
        let mut scores = self.scores.lock().unwrap_or_else(PoisonError::into_inner);
        let (home, away) = scores.entry(event_id.to_string()).or_insert((0, 0));

        let mut rng = rand::rng();
        if rng.random_bool(self.goal_probability) {
            if rng.random_bool(0.5) {
                *home += 1;
            } else {
                *away += 1;
            }
            debug!(event_id, score = %format!("{home}:{away}"), "Mock score changed");
        }

        ScoreResult::new(event_id, format!("{home}:{away}"))
    }
}

impl Default for MockScoreApi {
    fn default() -> Self {
        Self::new(DEFAULT_GOAL_PROBABILITY)
    }
}
