//! Status-change entry point.
//!
//! Ties the store and the scheduler together. A status change reaches the
//! store and the active set under one lock.

use std::sync::Arc;

use super::event::Event;
use super::scheduler::PollingScheduler;
use super::store::EventStore;

/// Facade used by request handlers.
#[derive(Clone)]
pub struct LiveEventTracker {
    store: Arc<EventStore>,
    scheduler: Arc<PollingScheduler>,
}

impl LiveEventTracker {
    /// Creates a tracker over a store and the scheduler polling it.
    #[must_use]
    pub fn new(store: Arc<EventStore>, scheduler: Arc<PollingScheduler>) -> Self {
        Self { store, scheduler }
    }

    /// Returns the store.
    #[must_use]
    pub fn store(&self) -> Arc<EventStore> {
        Arc::clone(&self.store)
    }

    /// Returns the scheduler.
    #[must_use]
    pub fn scheduler(&self) -> Arc<PollingScheduler> {
        Arc::clone(&self.scheduler)
    }

    /// Applies a status change and (un)schedules polling accordingly.
    ///
    /// The latest call wins; no debouncing is applied.
    pub async fn update_status(&self, event_id: &str, is_live: bool) -> Event {
        self.scheduler.apply_status(event_id, is_live).await
    }

    /// Returns the current state of an event.
    pub async fn get_event(&self, event_id: &str) -> Option<Event> {
        self.store.get(event_id).await
    }

    /// Returns true if the event is currently polled.
    pub async fn is_scheduled(&self, event_id: &str) -> bool {
        self.scheduler.is_scheduled(event_id).await
    }

    /// Returns the ids currently polled.
    pub async fn active_events(&self) -> Vec<String> {
        self.scheduler.active_events().await
    }
}
