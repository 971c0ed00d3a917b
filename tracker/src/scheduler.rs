//! Polling scheduler.
//!
//! Owns the active set: the ids believed to be LIVE. On every tick the set is
//! reconciled against the store, and each still-live event is fetched,
//! stored and published. A failure for one event is logged and never stops
//! the rest of the tick.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{watch, RwLock};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::event::{Event, UpdateMessage};
use super::fetcher::ExternalFetcher;
use super::metrics::TrackerMetrics;
use super::publisher::{PublishResult, UpdatePublisher};
use super::store::EventStore;

/// Shortest period an [`IntervalTicker`] accepts.
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// Source of tick signals driving [`PollingScheduler::run`].
#[async_trait]
pub trait Ticker: Send {
    /// Waits for the next tick.
    async fn tick(&mut self);
}

/// Fixed-rate ticker backed by a tokio interval.
///
/// The first tick fires one full period after creation. When a tick overruns,
/// the next one is delayed rather than fired in a burst.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// Creates a ticker with the given period, raised to at least 1ms.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        let period = period.max(MIN_TICK_PERIOD);
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

/// How a single event fared in a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollOutcome {
    Evicted,
    Kept,
    Empty,
    FetchFailed,
    Published,
    PublishFailed,
}

/// Periodic poller over the active set.
pub struct PollingScheduler {
    /// Authoritative event state.
    store: Arc<EventStore>,

    /// Retrying score fetcher.
    fetcher: ExternalFetcher,

    /// Retrying update publisher.
    publisher: UpdatePublisher,

    /// Ids currently polled.
    active: RwLock<HashSet<String>>,

    /// Metrics.
    metrics: Arc<TrackerMetrics>,

    /// Whether the polling loop is running.
    running: AtomicBool,
}

impl PollingScheduler {
    /// Creates a new scheduler.
    #[must_use]
    pub fn new(
        store: Arc<EventStore>,
        fetcher: ExternalFetcher,
        publisher: UpdatePublisher,
        metrics: Arc<TrackerMetrics>,
    ) -> Self {
        Self {
            store,
            fetcher,
            publisher,
            active: RwLock::new(HashSet::new()),
            metrics,
            running: AtomicBool::new(false),
        }
    }

    /// Returns the metrics.
    #[must_use]
    pub fn metrics(&self) -> Arc<TrackerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Returns true if the polling loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Writes a status change to the store and updates the active set as one
    /// step.
    ///
    /// The active-set write lock is held across the store write (lock order:
    /// active set, then store), so the set always ends up agreeing with the
    /// last status stored for the id.
    pub async fn apply_status(&self, event_id: &str, is_live: bool) -> Event {
        let mut active = self.active.write().await;
        let event = self.store.upsert_status(event_id, is_live).await;

        if event.is_live() {
            let inserted = active.insert(event_id.to_string());
            info!(event_id, newly_scheduled = inserted, "Scheduling event for polling");
        } else {
            let removed = active.remove(event_id);
            info!(event_id, was_scheduled = removed, "Unscheduling event from polling");
        }

        event
    }

    /// Adds an event to the active set. Idempotent.
    ///
    /// Returns true if the id was not already scheduled.
    pub async fn schedule_event_polling(&self, event_id: &str) -> bool {
        let inserted = self.active.write().await.insert(event_id.to_string());
        info!(event_id, newly_scheduled = inserted, "Scheduling event for polling");
        inserted
    }

    /// Removes an event from the active set. Idempotent.
    ///
    /// Returns true if the id was scheduled.
    pub async fn unschedule_event_polling(&self, event_id: &str) -> bool {
        let removed = self.active.write().await.remove(event_id);
        info!(event_id, was_scheduled = removed, "Unscheduling event from polling");
        removed
    }

    /// Returns true if the event is in the active set.
    pub async fn is_scheduled(&self, event_id: &str) -> bool {
        self.active.read().await.contains(event_id)
    }

    /// Returns the active ids, sorted.
    pub async fn active_events(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.active.read().await.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Runs one polling pass over a snapshot of the active set.
    ///
    /// Ids scheduled while the pass is running are picked up by the next one.
    pub async fn tick(&self) {
        let ids = self.active_events().await;
        info!(active_events = ids.len(), "Starting scheduled polling of live events");

        let mut published = 0usize;
        let mut evicted = 0usize;
        let mut failed = 0usize;

        for event_id in &ids {
            match self.poll_event(event_id).await {
                PollOutcome::Published => published += 1,
                PollOutcome::Evicted => evicted += 1,
                PollOutcome::FetchFailed | PollOutcome::PublishFailed => failed += 1,
                PollOutcome::Kept | PollOutcome::Empty => {}
            }
        }

        self.metrics.record_tick();
        info!(
            polled = ids.len() - evicted,
            published, evicted, failed, "Finished polling of live events"
        );
    }

    /// Polls one event. Every failure is absorbed here.
    async fn poll_event(&self, event_id: &str) -> PollOutcome {
        let is_live = self
            .store
            .get(event_id)
            .await
            .is_some_and(|event| event.is_live());
        if !is_live {
            return self.evict_if_not_live(event_id).await;
        }

        self.metrics.record_poll();
        let now = Utc::now();
        if !self.store.record_poll_attempt(event_id, now).await {
            debug!(event_id, "Could not record poll attempt, event vanished");
        }

        let score = match self.fetcher.fetch(event_id).await {
            Ok(Some(score)) => score,
            Ok(None) => {
                warn!(event_id, "Received no data from external API");
                self.metrics.record_empty_result();
                return PollOutcome::Empty;
            }
            Err(e) => {
                warn!(event_id, attempts = e.attempts(), "Error polling event: {}", e);
                self.metrics.record_fetch_failure();
                return PollOutcome::FetchFailed;
            }
        };

        let now = Utc::now();
        if self
            .store
            .record_poll_result(event_id, &score.current_score, now)
            .await
        {
            self.metrics.record_score_updated();
        } else {
            debug!(event_id, "Event vanished before its score was stored");
        }

        let message = UpdateMessage::from_score(&score, now);
        match self.publisher.publish(&message).await {
            PublishResult::Published { .. } => {
                debug!(
                    event_id,
                    current_score = %score.current_score,
                    "Event polled successfully"
                );
                PollOutcome::Published
            }
            PublishResult::Failed { .. } => PollOutcome::PublishFailed,
        }
    }

    /// Drops an id whose event is missing or not LIVE.
    ///
    /// The store is re-checked under the active-set write lock, so a status
    /// change to LIVE that lands between the first check and the removal is
    /// never lost.
    async fn evict_if_not_live(&self, event_id: &str) -> PollOutcome {
        let mut active = self.active.write().await;
        let still_not_live = !self
            .store
            .get(event_id)
            .await
            .is_some_and(|event| event.is_live());

        if still_not_live && active.remove(event_id) {
            info!(event_id, "Event is no longer live, removing from polling");
            self.metrics.record_eviction();
            PollOutcome::Evicted
        } else {
            PollOutcome::Kept
        }
    }

    /// Runs the polling loop until `shutdown` flips to true or its sender is
    /// dropped.
    pub async fn run<T: Ticker>(&self, mut ticker: T, mut shutdown: watch::Receiver<bool>) {
        self.running.store(true, Ordering::Relaxed);
        info!("Polling scheduler started");

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Polling scheduler received shutdown signal");
                        break;
                    }
                }

                () = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        self.running.store(false, Ordering::Relaxed);
        info!("Polling scheduler stopped");
    }
}
