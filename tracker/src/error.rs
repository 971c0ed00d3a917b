//! Error types for the polling core.
//!
//! Fetch and publish failures are classified as retryable or not; the
//! scheduler catches all of them per event and turns them into log records.

/// Failure of a single call to a score source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// Network, timeout or server-side failure. Worth retrying.
    #[error("transient source failure: {0}")]
    Transient(String),

    /// Malformed or unexpected response. Retrying will not help.
    #[error("permanent source failure: {0}")]
    Permanent(String),
}

impl SourceError {
    /// Returns true if the failure may succeed on a later attempt.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Failure of [`ExternalFetcher::fetch`](crate::fetcher::ExternalFetcher::fetch).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// A non-retryable failure ended the fetch on its first occurrence.
    #[error("fetch failed on attempt {attempt}: {source}")]
    Permanent {
        /// Attempt that failed.
        attempt: u32,
        /// Underlying failure.
        source: SourceError,
    },

    /// Every attempt failed with a transient error.
    #[error("fetch failed after {attempts} attempts: {last}")]
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// Failure of the final attempt.
        last: SourceError,
    },
}

impl FetchError {
    /// Returns the number of attempts made before giving up.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Permanent { attempt, .. } => *attempt,
            Self::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// Failure of a single send on the message bus.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// The bus could not be reached or did not answer in time.
    #[error("bus unavailable: {0}")]
    Unavailable(String),

    /// The bus refused the record.
    #[error("bus rejected record: {0}")]
    Rejected(String),
}

impl BusError {
    /// Returns true if the send may succeed on a later attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<redis::RedisError> for BusError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() || err.is_io_error() || err.is_connection_dropped() {
            Self::Unavailable(err.to_string())
        } else {
            Self::Rejected(err.to_string())
        }
    }
}

/// Failure of [`UpdatePublisher::publish`](crate::publisher::UpdatePublisher::publish).
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The update could not be encoded; nothing was sent.
    #[error("failed to serialize update: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The send failed after the retry policy gave up.
    #[error("send failed after {attempts} attempts: {source}")]
    Send {
        /// Attempts made.
        attempts: u32,
        /// Failure of the final attempt.
        source: BusError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_classification() {
        assert!(SourceError::Transient("timeout".to_string()).is_transient());
        assert!(!SourceError::Permanent("bad json".to_string()).is_transient());
    }

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Exhausted {
            attempts: 3,
            last: SourceError::Transient("connection refused".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "fetch failed after 3 attempts: transient source failure: connection refused"
        );
        assert_eq!(err.attempts(), 3);
    }

    #[test]
    fn test_fetch_error_permanent_attempts() {
        let err = FetchError::Permanent {
            attempt: 1,
            source: SourceError::Permanent("bad json".to_string()),
        };
        assert_eq!(err.attempts(), 1);
    }

    #[test]
    fn test_bus_error_retryable() {
        assert!(BusError::Unavailable("down".to_string()).is_retryable());
        assert!(!BusError::Rejected("too large".to_string()).is_retryable());
    }

    #[test]
    fn test_publish_error_display() {
        let err = PublishError::Send {
            attempts: 3,
            source: BusError::Unavailable("down".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "send failed after 3 attempts: bus unavailable: down"
        );
    }
}
