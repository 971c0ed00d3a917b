//! Livescore Tracker - polling and propagation core.
//!
//! This crate keeps the state of tracked sports events, periodically refreshes
//! the score of every LIVE event from an external source and publishes each
//! refreshed score on a message bus.
//!
//! # Components
//!
//! - [`store`]: Authoritative in-memory event state
//! - [`fetcher`]: External score fetching with retries
//! - [`bus`]: Message bus sinks (Redis streams, logging)
//! - [`publisher`]: Update publishing with retries
//! - [`scheduler`]: Active set and periodic polling
//! - [`tracker`]: Status-change entry point
//! - [`retry`]: Retry with exponential backoff
//! - [`config`]: Tracker configuration
//! - [`metrics`]: Tracker metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use livescore_tracker::{build, TrackerConfig};
//!
//! let config = TrackerConfig::from_env()?;
//! let components = build(&config).await?;
//! components.tracker.update_status("E1", true).await;
//! components.scheduler.tick().await;
//! ```

pub mod bus;
pub mod config;
pub mod error;
pub mod event;
pub mod fetcher;
pub mod metrics;
pub mod publisher;
pub mod retry;
pub mod scheduler;
pub mod store;
pub mod tracker;

use std::sync::Arc;

use tracing::info;

pub use bus::{BusRecord, Delivery, LoggingBus, MessageBus, RedisStreamBus};
pub use config::{BusConfig, ConfigError, TrackerConfig};
pub use error::{BusError, FetchError, PublishError, SourceError};
pub use event::{Event, EventStatus, ScoreResult, UpdateMessage};
pub use fetcher::{ExternalFetcher, HttpScoreSource, ScoreSource};
pub use metrics::{TrackerMetrics, TrackerMetricsSnapshot};
pub use publisher::{PublishResult, UpdatePublisher};
pub use retry::{RetryError, RetryPolicy};
pub use scheduler::{IntervalTicker, PollingScheduler, Ticker, MIN_TICK_PERIOD};
pub use store::EventStore;
pub use tracker::LiveEventTracker;

/// Errors raised while wiring the core together.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The score source could not be created.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The message bus could not be reached.
    #[error(transparent)]
    Bus(#[from] BusError),
}

/// The wired polling core.
pub struct Components {
    /// Status-change entry point.
    pub tracker: LiveEventTracker,
    /// Scheduler to drive with [`PollingScheduler::run`].
    pub scheduler: Arc<PollingScheduler>,
    /// Shared metrics.
    pub metrics: Arc<TrackerMetrics>,
}

/// Builds the core from configuration, using the HTTP score source and the
/// Redis bus when a Redis URL is configured (the logging bus otherwise).
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a collaborator cannot
/// be created.
pub async fn build(config: &TrackerConfig) -> Result<Components, BuildError> {
    config.validate()?;

    let source: Arc<dyn ScoreSource> = Arc::new(HttpScoreSource::new(config)?);
    let bus: Arc<dyn MessageBus> = match &config.bus.redis_url {
        Some(url) => Arc::new(RedisStreamBus::connect(url, &config.bus).await?),
        None => {
            info!("No Redis URL configured, updates will only be logged");
            Arc::new(LoggingBus::new())
        }
    };

    Ok(assemble(config, source, bus))
}

/// Wires the core over the given collaborators.
#[must_use]
pub fn assemble(
    config: &TrackerConfig,
    source: Arc<dyn ScoreSource>,
    bus: Arc<dyn MessageBus>,
) -> Components {
    let metrics = Arc::new(TrackerMetrics::new());
    let store = Arc::new(EventStore::new());

    let fetcher = ExternalFetcher::new(source, config.fetch_retry.clone());
    let publisher = UpdatePublisher::with_metrics(
        bus,
        &config.bus,
        config.publish_retry.clone(),
        Arc::clone(&metrics),
    );
    let scheduler = Arc::new(PollingScheduler::new(
        Arc::clone(&store),
        fetcher,
        publisher,
        Arc::clone(&metrics),
    ));

    Components {
        tracker: LiveEventTracker::new(store, Arc::clone(&scheduler)),
        scheduler,
        metrics,
    }
}
