//! Tracked event types.
//!
//! Provides the event record held by the store, the score returned by an
//! external source, and the update message published on the bus.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Live status of a tracked event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// The event is in play and eligible for polling.
    Live,
    /// The event is not in play.
    NotLive,
}

impl EventStatus {
    /// Maps a live flag to a status.
    #[must_use]
    pub const fn from_live(is_live: bool) -> Self {
        if is_live {
            Self::Live
        } else {
            Self::NotLive
        }
    }

    /// Returns true if the status is LIVE.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    /// Returns the wire name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "LIVE",
            Self::NotLive => "NOT_LIVE",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked sports event.
///
/// Records are replaced as a unit inside [`EventStore`](crate::store::EventStore);
/// callers only ever see complete snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Externally supplied identifier.
    pub event_id: String,

    /// Live status, unset until the first status update.
    pub status: Option<EventStatus>,

    /// Latest score (`home:away` by convention), unset until the first
    /// successful poll.
    pub current_score: Option<String>,

    /// Time of the last status or score change.
    pub last_updated: Option<DateTime<Utc>>,

    /// Time of the last poll attempt.
    pub last_polled: Option<DateTime<Utc>>,
}

impl Event {
    /// Creates an empty record for the given id.
    #[must_use]
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            status: None,
            current_score: None,
            last_updated: None,
            last_polled: None,
        }
    }

    /// Returns true if the event is currently LIVE.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.status.is_some_and(|s| s.is_live())
    }
}

/// Score data returned by an external source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    /// Event the score belongs to.
    pub event_id: String,

    /// Current score.
    pub current_score: String,
}

impl ScoreResult {
    /// Creates a new score result.
    #[must_use]
    pub fn new(event_id: impl Into<String>, current_score: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            current_score: current_score.into(),
        }
    }
}

/// Update emitted on the message bus after a successful poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMessage {
    /// Event identifier, also the partition key.
    pub event_id: String,

    /// Score observed by the poll.
    pub current_score: String,

    /// Time of the poll.
    pub timestamp: DateTime<Utc>,
}

impl UpdateMessage {
    /// Builds an update from a fetched score.
    #[must_use]
    pub fn from_score(score: &ScoreResult, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_id: score.event_id.clone(),
            current_score: score.current_score.clone(),
            timestamp,
        }
    }

    /// Serializes the message to its wire representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be encoded.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
