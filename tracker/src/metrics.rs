//! Tracker metrics.
//!
//! Provides atomic counters for monitoring polling and publishing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Metrics for the polling core.
#[derive(Debug)]
pub struct TrackerMetrics {
    /// Completed ticks.
    ticks: AtomicU64,

    /// Poll attempts (one per live event per tick).
    polls: AtomicU64,

    /// Ids dropped from the active set because the event was no longer live.
    evictions: AtomicU64,

    /// Polls where the source had no data.
    empty_results: AtomicU64,

    /// Polls whose fetch failed.
    fetch_failures: AtomicU64,

    /// Scores written to the store.
    scores_updated: AtomicU64,

    /// Updates acknowledged by the bus.
    published: AtomicU64,

    /// Updates that could not be published.
    publish_failures: AtomicU64,

    /// Start time for uptime.
    start_time: Instant,
}

impl Default for TrackerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerMetrics {
    /// Creates a new metrics instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            polls: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            empty_results: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            scores_updated: AtomicU64::new(0),
            published: AtomicU64::new(0),
            publish_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Records a completed tick.
    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a poll attempt.
    pub fn record_poll(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an eviction from the active set.
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a poll with no data.
    pub fn record_empty_result(&self) {
        self.empty_results.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed fetch.
    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a stored score.
    pub fn record_score_updated(&self) {
        self.scores_updated.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a published update.
    pub fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed publish.
    pub fn record_publish_failure(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns completed ticks.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Returns poll attempts.
    #[must_use]
    pub fn polls(&self) -> u64 {
        self.polls.load(Ordering::Relaxed)
    }

    /// Returns evictions.
    #[must_use]
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Returns polls with no data.
    #[must_use]
    pub fn empty_results(&self) -> u64 {
        self.empty_results.load(Ordering::Relaxed)
    }

    /// Returns failed fetches.
    #[must_use]
    pub fn fetch_failures(&self) -> u64 {
        self.fetch_failures.load(Ordering::Relaxed)
    }

    /// Returns stored scores.
    #[must_use]
    pub fn scores_updated(&self) -> u64 {
        self.scores_updated.load(Ordering::Relaxed)
    }

    /// Returns published updates.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Returns failed publishes.
    #[must_use]
    pub fn publish_failures(&self) -> u64 {
        self.publish_failures.load(Ordering::Relaxed)
    }

    /// Returns the uptime.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns the share of polls that were published (0.0 to 1.0).
    #[must_use]
    pub fn publish_rate(&self) -> f64 {
        let polls = self.polls();
        if polls > 0 {
            self.published() as f64 / polls as f64
        } else {
            0.0
        }
    }

    /// Returns a snapshot of all metrics.
    #[must_use]
    pub fn snapshot(&self) -> TrackerMetricsSnapshot {
        TrackerMetricsSnapshot {
            ticks: self.ticks(),
            polls: self.polls(),
            evictions: self.evictions(),
            empty_results: self.empty_results(),
            fetch_failures: self.fetch_failures(),
            scores_updated: self.scores_updated(),
            published: self.published(),
            publish_failures: self.publish_failures(),
            uptime_secs: self.uptime().as_secs(),
            publish_rate: self.publish_rate(),
        }
    }
}

/// A point-in-time snapshot of tracker metrics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerMetricsSnapshot {
    /// Completed ticks.
    pub ticks: u64,
    /// Poll attempts.
    pub polls: u64,
    /// Evictions from the active set.
    pub evictions: u64,
    /// Polls with no data.
    pub empty_results: u64,
    /// Failed fetches.
    pub fetch_failures: u64,
    /// Stored scores.
    pub scores_updated: u64,
    /// Published updates.
    pub published: u64,
    /// Failed publishes.
    pub publish_failures: u64,
    /// Uptime in seconds.
    pub uptime_secs: u64,
    /// Published updates per poll.
    pub publish_rate: f64,
}
