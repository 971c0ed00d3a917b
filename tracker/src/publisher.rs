//! Update publishing.
//!
//! Serializes score updates and sends them on the bus with retries. Delivery
//! is best effort: the outcome is logged and reported back as a
//! [`PublishResult`], never as an error the caller has to handle.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::bus::{partition_for, BusRecord, Delivery, MessageBus};
use super::config::BusConfig;
use super::error::{BusError, PublishError};
use super::event::UpdateMessage;
use super::metrics::TrackerMetrics;
use super::retry::RetryPolicy;

/// Result of publishing one update.
#[derive(Debug)]
pub enum PublishResult {
    /// The bus acknowledged the update.
    Published {
        /// Where the update landed.
        delivery: Delivery,
        /// Attempts used.
        attempts: u32,
    },

    /// The update was not delivered.
    Failed {
        /// Why.
        error: PublishError,
    },
}

impl PublishResult {
    /// Returns true if the update was delivered.
    #[must_use]
    pub const fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }

    /// Returns true if the update was not delivered.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Returns the delivery acknowledgement, if any.
    #[must_use]
    pub const fn delivery(&self) -> Option<&Delivery> {
        match self {
            Self::Published { delivery, .. } => Some(delivery),
            Self::Failed { .. } => None,
        }
    }
}

/// Publishes score updates to a topic keyed by event id.
pub struct UpdatePublisher {
    /// Destination bus.
    bus: Arc<dyn MessageBus>,

    /// Topic name.
    topic: String,

    /// Partition count of the topic.
    partitions: u32,

    /// Retry policy for sends.
    policy: RetryPolicy,

    /// Metrics.
    metrics: Option<Arc<TrackerMetrics>>,
}

impl UpdatePublisher {
    /// Creates a new publisher.
    #[must_use]
    pub fn new(bus: Arc<dyn MessageBus>, config: &BusConfig, policy: RetryPolicy) -> Self {
        Self {
            bus,
            topic: config.topic.clone(),
            partitions: config.partitions,
            policy,
            metrics: None,
        }
    }

    /// Creates a publisher with metrics.
    #[must_use]
    pub fn with_metrics(
        bus: Arc<dyn MessageBus>,
        config: &BusConfig,
        policy: RetryPolicy,
        metrics: Arc<TrackerMetrics>,
    ) -> Self {
        Self {
            metrics: Some(metrics),
            ..Self::new(bus, config, policy)
        }
    }

    /// Returns the topic name.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Builds the bus record for an update.
    ///
    /// # Errors
    ///
    /// Returns an error if the update cannot be serialized.
    pub fn build_record(&self, message: &UpdateMessage) -> Result<BusRecord, PublishError> {
        Ok(BusRecord {
            topic: self.topic.clone(),
            key: message.event_id.clone(),
            partition: partition_for(&message.event_id, self.partitions),
            payload: message.to_json()?,
        })
    }

    /// Publishes an update.
    ///
    /// Serialization failures are not retried. Send failures are retried per
    /// the policy while they are retryable. The outcome is logged either way.
    pub async fn publish(&self, message: &UpdateMessage) -> PublishResult {
        let key = message.event_id.as_str();

        let record = match self.build_record(message) {
            Ok(record) => record,
            Err(e) => {
                error!(key, "Error serializing update: {}", e);
                self.record_failure();
                return PublishResult::Failed { error: e };
            }
        };

        debug!(
            topic = %record.topic,
            key,
            partition = record.partition,
            payload = %record.payload,
            "Publishing update"
        );

        let mut attempts = 0;
        let result = self
            .policy
            .run(
                |attempt| {
                    attempts = attempt;
                    self.bus.send(record.clone())
                },
                BusError::is_retryable,
            )
            .await;

        match result {
            Ok(delivery) => {
                info!(
                    topic = %self.topic,
                    key,
                    partition = delivery.partition,
                    offset = %delivery.offset,
                    "Update published"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_published();
                }
                PublishResult::Published { delivery, attempts }
            }
            Err(err) => {
                let error = PublishError::Send {
                    attempts: err.attempts(),
                    source: err.into_inner(),
                };
                warn!(topic = %self.topic, key, "Failed to publish update: {}", error);
                self.record_failure();
                PublishResult::Failed { error }
            }
        }
    }

    fn record_failure(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.record_publish_failure();
        }
    }
}
