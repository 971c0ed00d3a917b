//! External score fetching.
//!
//! A [`ScoreSource`] performs one call against the external score API;
//! [`ExternalFetcher`] wraps it with the retry policy. Only transient
//! failures are retried.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use super::config::{TrackerConfig, EVENT_ID_PLACEHOLDER};
use super::error::{FetchError, SourceError};
use super::event::ScoreResult;
use super::retry::{RetryError, RetryPolicy};

/// A source of current scores.
#[async_trait]
pub trait ScoreSource: Send + Sync {
    /// Fetches the current score of one event.
    ///
    /// Returns `Ok(None)` when the source has no data for the event.
    async fn fetch_score(&self, event_id: &str) -> Result<Option<ScoreResult>, SourceError>;
}

/// Score source backed by the external HTTP API.
#[derive(Debug, Clone)]
pub struct HttpScoreSource {
    http: reqwest::Client,
    base_url: String,
    endpoint: String,
}

impl HttpScoreSource {
    /// Creates a source from the tracker configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &TrackerConfig) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(format!("livescore-tracker/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Permanent(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.external_api_base_url.trim_end_matches('/').to_string(),
            endpoint: config.event_endpoint.clone(),
        })
    }

    /// Returns the URL queried for the given event.
    #[must_use]
    pub fn url_for(&self, event_id: &str) -> String {
        format!(
            "{}{}",
            self.base_url,
            self.endpoint.replace(EVENT_ID_PLACEHOLDER, event_id)
        )
    }
}

#[async_trait]
impl ScoreSource for HttpScoreSource {
    async fn fetch_score(&self, event_id: &str) -> Result<Option<ScoreResult>, SourceError> {
        let url = self.url_for(event_id);
        debug!(event_id, %url, "Fetching score from external API");

        let resp = self.http.get(&url).send().await.map_err(classify_request_error)?;
        let status = resp.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::Transient(format!("external API returned {status}")));
        }

        if !status.is_success() {
            return Err(SourceError::Permanent(format!("external API returned {status}")));
        }

        let body = resp.text().await.map_err(classify_request_error)?;
        let body = body.trim();
        if body.is_empty() || body == "null" {
            return Ok(None);
        }

        let score: ScoreResult = serde_json::from_str(body)
            .map_err(|e| SourceError::Permanent(format!("malformed response: {e}")))?;

        if score.event_id != event_id {
            return Err(SourceError::Permanent(format!(
                "response for unexpected event {}",
                score.event_id
            )));
        }

        Ok(Some(score))
    }
}

fn classify_request_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
        SourceError::Transient(err.to_string())
    } else {
        SourceError::Permanent(err.to_string())
    }
}

/// Fetches scores with bounded retry and exponential backoff.
pub struct ExternalFetcher {
    source: Arc<dyn ScoreSource>,
    policy: RetryPolicy,
}

impl ExternalFetcher {
    /// Creates a fetcher over the given source.
    #[must_use]
    pub fn new(source: Arc<dyn ScoreSource>, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches the current score of an event.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Permanent`] on the first non-transient failure and
    /// [`FetchError::Exhausted`] once every attempt failed.
    pub async fn fetch(&self, event_id: &str) -> Result<Option<ScoreResult>, FetchError> {
        let result = self
            .policy
            .run(
                |attempt| {
                    debug!(event_id, attempt, "Fetch attempt");
                    self.source.fetch_score(event_id)
                },
                SourceError::is_transient,
            )
            .await;

        result.map_err(|err| {
            let err = match err {
                RetryError::Aborted { attempt, error } => FetchError::Permanent {
                    attempt,
                    source: error,
                },
                RetryError::Exhausted { attempts, error } => FetchError::Exhausted {
                    attempts,
                    last: error,
                },
            };
            debug!(event_id, "Error fetching score: {}", err);
            err
        })
    }
}
