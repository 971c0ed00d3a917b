//! In-memory event store.
//!
//! Authoritative state for every tracked event. Each operation replaces the
//! record under the store's write lock, so readers never observe a partially
//! updated event.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;

use super::event::{Event, EventStatus};

/// Thread-safe map from event id to event state.
#[derive(Debug, Default)]
pub struct EventStore {
    events: RwLock<HashMap<String, Event>>,
}

impl EventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
        }
    }

    /// Sets the live status of an event, creating the record if absent.
    ///
    /// Returns the updated record.
    pub async fn upsert_status(&self, event_id: &str, is_live: bool) -> Event {
        let status = EventStatus::from_live(is_live);
        let now = Utc::now();

        let mut events = self.events.write().await;
        let mut event = events
            .get(event_id)
            .cloned()
            .unwrap_or_else(|| Event::new(event_id));
        event.status = Some(status);
        event.last_updated = Some(now);
        events.insert(event_id.to_string(), event.clone());

        info!(event_id, %status, "Updated event status");
        event
    }

    /// Returns a snapshot of the event, if tracked.
    pub async fn get(&self, event_id: &str) -> Option<Event> {
        self.events.read().await.get(event_id).cloned()
    }

    /// Records a poll attempt.
    ///
    /// Returns false if the event is not tracked.
    pub async fn record_poll_attempt(&self, event_id: &str, now: DateTime<Utc>) -> bool {
        let mut events = self.events.write().await;
        match events.get(event_id).cloned() {
            Some(mut event) => {
                event.last_polled = Some(now);
                events.insert(event_id.to_string(), event);
                true
            }
            None => false,
        }
    }

    /// Stores the score of a successful poll.
    ///
    /// `last_updated` moves only when the score actually changed. Does nothing
    /// and returns false if the event is not tracked.
    pub async fn record_poll_result(
        &self,
        event_id: &str,
        score: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let mut events = self.events.write().await;
        let Some(mut event) = events.get(event_id).cloned() else {
            return false;
        };

        if event.current_score.as_deref() != Some(score) {
            event.current_score = Some(score.to_string());
            event.last_updated = Some(now);
        }
        event.last_polled = Some(now);
        events.insert(event_id.to_string(), event);
        true
    }

    /// Returns the number of tracked events.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    /// Returns true if no events are tracked.
    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    #[tokio::test]
    async fn test_upsert_creates_record() {
        let store = EventStore::new();

        let event = store.upsert_status("E1", true).await;

        assert_eq!(event.status, Some(EventStatus::Live));
        assert!(event.last_updated.is_some());
        assert!(event.current_score.is_none());
        assert_eq!(store.get("E1").await, Some(event));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_upsert_keeps_score() {
        let store = EventStore::new();
        store.upsert_status("E1", true).await;
        store.record_poll_result("E1", "2:0", Utc::now()).await;

        let event = store.upsert_status("E1", false).await;

        assert_eq!(event.status, Some(EventStatus::NotLive));
        assert_eq!(event.current_score.as_deref(), Some("2:0"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = EventStore::new();
        assert!(store.get("nope").await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_record_poll_result() {
        let store = EventStore::new();
        store.upsert_status("E1", true).await;
        let now = Utc::now();

        assert!(store.record_poll_result("E1", "1:0", now).await);

        let event = store.get("E1").await.expect("event");
        assert_eq!(event.current_score.as_deref(), Some("1:0"));
        assert_eq!(event.last_polled, Some(now));
        assert_eq!(event.last_updated, Some(now));
    }

    #[tokio::test]
    async fn test_record_unchanged_score_keeps_last_updated() {
        let store = EventStore::new();
        store.upsert_status("E1", true).await;
        let first = Utc::now();
        store.record_poll_result("E1", "1:0", first).await;

        let later = first + chrono::Duration::seconds(10);
        store.record_poll_result("E1", "1:0", later).await;

        let event = store.get("E1").await.expect("event");
        assert_eq!(event.last_updated, Some(first));
        assert_eq!(event.last_polled, Some(later));
    }

    #[tokio::test]
    async fn test_record_on_missing_is_noop() {
        let store = EventStore::new();

        assert!(!store.record_poll_result("ghost", "1:0", Utc::now()).await);
        assert!(!store.record_poll_attempt("ghost", Utc::now()).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_record_poll_attempt() {
        let store = EventStore::new();
        store.upsert_status("E1", true).await;
        let now = Utc::now();

        assert!(store.record_poll_attempt("E1", now).await);

        let event = store.get("E1").await.expect("event");
        assert_eq!(event.last_polled, Some(now));
        assert!(event.current_score.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_upserts_single_record() {
        let store = Arc::new(EventStore::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.upsert_status("E1", i % 2 == 0).await })
            })
            .collect();
        for handle in handles {
            handle.await.expect("join");
        }

        assert_eq!(store.len().await, 1);
        assert!(store.get("E1").await.expect("event").status.is_some());
    }
}
