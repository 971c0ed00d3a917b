//! Tracker configuration.
//!
//! Provides configuration options for polling, the external score API and
//! the message bus. Values can be overlaid from `LIVESCORE_*` environment
//! variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::retry::RetryPolicy;

/// Placeholder replaced by the event id in [`TrackerConfig::event_endpoint`].
pub const EVENT_ID_PLACEHOLDER: &str = "{eventId}";

/// Default poll interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;

/// Default topic for score updates.
pub const DEFAULT_TOPIC: &str = "event-updates";

/// Message bus configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Topic updates are published to.
    pub topic: String,

    /// Number of partitions (ordering lanes) in the topic.
    pub partitions: u32,

    /// Redis URL. When unset, updates are only logged.
    pub redis_url: Option<String>,

    /// Approximate cap on entries kept per partition stream.
    pub stream_max_len: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            partitions: 3,
            redis_url: None,
            stream_max_len: 10_000,
        }
    }
}

/// Configuration for the tracker core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Poll interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Retry policy for external fetches.
    pub fetch_retry: RetryPolicy,

    /// Retry policy for bus sends.
    pub publish_retry: RetryPolicy,

    /// Base URL of the external score API.
    pub external_api_base_url: String,

    /// Path template of the score endpoint, containing `{eventId}`.
    pub event_endpoint: String,

    /// Timeout for a single external request in milliseconds.
    pub request_timeout_ms: u64,

    /// Message bus settings.
    pub bus: BusConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            fetch_retry: RetryPolicy::default(),
            publish_retry: RetryPolicy::default(),
            external_api_base_url: "http://localhost:8080".to_string(),
            event_endpoint: "/api/mock/events/{eventId}".to_string(),
            request_timeout_ms: 5_000,
            bus: BusConfig::default(),
        }
    }
}

impl TrackerConfig {
    /// Loads the configuration from `LIVESCORE_*` environment variables,
    /// falling back to defaults for unset ones.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or the resulting
    /// configuration is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(ms) = env_parse("LIVESCORE_POLL_INTERVAL_MS")? {
            config.poll_interval_ms = ms;
        }
        if let Some(url) = env_string("LIVESCORE_EXTERNAL_API_BASE_URL") {
            config.external_api_base_url = url;
        }
        if let Some(endpoint) = env_string("LIVESCORE_EVENT_ENDPOINT") {
            config.event_endpoint = endpoint;
        }
        if let Some(ms) = env_parse("LIVESCORE_REQUEST_TIMEOUT_MS")? {
            config.request_timeout_ms = ms;
        }
        if let Some(attempts) = env_parse("LIVESCORE_MAX_ATTEMPTS")? {
            config.fetch_retry.max_attempts = attempts;
            config.publish_retry.max_attempts = attempts;
        }
        if let Some(ms) = env_parse("LIVESCORE_INITIAL_BACKOFF_MS")? {
            config.fetch_retry.initial_backoff_ms = ms;
            config.publish_retry.initial_backoff_ms = ms;
        }
        if let Some(topic) = env_string("LIVESCORE_TOPIC") {
            config.bus.topic = topic;
        }
        if let Some(partitions) = env_parse("LIVESCORE_PARTITIONS")? {
            config.bus.partitions = partitions;
        }
        config.bus.redis_url = env_string("LIVESCORE_REDIS_URL");

        config.validate()?;
        Ok(config)
    }

    /// Sets the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Sets the external API location.
    #[must_use]
    pub fn with_external_api(
        mut self,
        base_url: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        self.external_api_base_url = base_url.into();
        self.event_endpoint = endpoint.into();
        self
    }

    /// Sets the same retry policy for fetches and publishes.
    #[must_use]
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.fetch_retry = policy.clone();
        self.publish_retry = policy;
        self
    }

    /// Sets the Redis URL of the message bus.
    #[must_use]
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.bus.redis_url = Some(url.into());
        self
    }

    /// Returns the poll interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }

        for policy in [&self.fetch_retry, &self.publish_retry] {
            if policy.max_attempts == 0 {
                return Err(ConfigError::InvalidMaxAttempts);
            }
            if policy.backoff_multiplier < 1.0 {
                return Err(ConfigError::InvalidBackoffMultiplier);
            }
        }

        if !self.external_api_base_url.starts_with("http://")
            && !self.external_api_base_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidBaseUrl(
                self.external_api_base_url.clone(),
            ));
        }

        if !self.event_endpoint.contains(EVENT_ID_PLACEHOLDER) {
            return Err(ConfigError::InvalidEndpoint(self.event_endpoint.clone()));
        }

        if self.bus.topic.is_empty() {
            return Err(ConfigError::EmptyTopic);
        }

        if self.bus.partitions == 0 {
            return Err(ConfigError::InvalidPartitions);
        }

        Ok(())
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    env_string(key)
        .map(|raw| {
            raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: key.to_string(),
                value: raw.clone(),
            })
        })
        .transpose()
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Invalid poll interval.
    #[error("poll_interval_ms must be > 0")]
    InvalidPollInterval,

    /// Invalid attempt budget.
    #[error("max_attempts must be >= 1")]
    InvalidMaxAttempts,

    /// Invalid backoff multiplier.
    #[error("backoff_multiplier must be >= 1.0")]
    InvalidBackoffMultiplier,

    /// Invalid external API base URL.
    #[error("external API base URL must start with http:// or https://: {0}")]
    InvalidBaseUrl(String),

    /// Endpoint template without the event id placeholder.
    #[error("event endpoint must contain {{eventId}}: {0}")]
    InvalidEndpoint(String),

    /// Empty topic name.
    #[error("topic cannot be empty")]
    EmptyTopic,

    /// Invalid partition count.
    #[error("partitions must be >= 1")]
    InvalidPartitions,

    /// Environment variable that could not be parsed.
    #[error("invalid value for {key}: {value}")]
    InvalidEnv {
        /// Variable name.
        key: String,
        /// Raw value.
        value: String,
    },
}
