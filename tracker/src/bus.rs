//! Message bus sinks.
//!
//! Updates are sent as keyed records. The key picks a partition through a
//! stable hash, so every update of one event travels on the same ordering
//! lane.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::info;

use super::config::BusConfig;
use super::error::BusError;

/// A keyed record ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusRecord {
    /// Destination topic.
    pub topic: String,
    /// Record key (the event id).
    pub key: String,
    /// Partition derived from the key.
    pub partition: u32,
    /// Serialized payload.
    pub payload: String,
}

/// Acknowledgement of a delivered record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Partition the record landed on.
    pub partition: u32,
    /// Position of the record within the partition.
    pub offset: String,
}

/// A sink for keyed records.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Sends one record and waits for the bus to acknowledge it.
    async fn send(&self, record: BusRecord) -> Result<Delivery, BusError>;
}

/// Maps a key to a partition using FNV-1a, stable across processes.
#[must_use]
pub fn partition_for(key: &str, partitions: u32) -> u32 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;

    let hash = key.bytes().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    });
    (hash % u64::from(partitions.max(1))) as u32
}

/// Bus backed by Redis streams, one stream per partition.
///
/// Records are appended with `XADD {topic}:{partition}`; the stream entry id
/// is reported as the offset.
#[derive(Clone)]
pub struct RedisStreamBus {
    conn: ConnectionManager,
    max_len: u64,
}

impl RedisStreamBus {
    /// Connects to Redis.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the connection fails.
    pub async fn connect(url: &str, config: &BusConfig) -> Result<Self, BusError> {
        let client = redis::Client::open(url)
            .map_err(|e| BusError::Rejected(format!("invalid redis url: {e}")))?;
        let conn = client.get_connection_manager().await?;
        info!(topic = %config.topic, partitions = config.partitions, "Connected to Redis bus");

        Ok(Self {
            conn,
            max_len: config.stream_max_len,
        })
    }

    /// Returns the stream name of a topic partition.
    #[must_use]
    pub fn stream_name(topic: &str, partition: u32) -> String {
        format!("{topic}:{partition}")
    }
}

#[async_trait]
impl MessageBus for RedisStreamBus {
    async fn send(&self, record: BusRecord) -> Result<Delivery, BusError> {
        let stream = Self::stream_name(&record.topic, record.partition);
        let mut conn = self.conn.clone();

        let offset: String = redis::cmd("XADD")
            .arg(&stream)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.max_len)
            .arg("*")
            .arg("key")
            .arg(&record.key)
            .arg("payload")
            .arg(&record.payload)
            .query_async(&mut conn)
            .await?;

        Ok(Delivery {
            partition: record.partition,
            offset,
        })
    }
}

/// Bus that only logs records. Used when no broker is configured.
#[derive(Debug, Default)]
pub struct LoggingBus {
    next_offset: AtomicU64,
}

impl LoggingBus {
    /// Creates a logging bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageBus for LoggingBus {
    async fn send(&self, record: BusRecord) -> Result<Delivery, BusError> {
        let offset = self.next_offset.fetch_add(1, Ordering::Relaxed);
        info!(
            topic = %record.topic,
            key = %record.key,
            partition = record.partition,
            payload = %record.payload,
            "Logging bus: would publish update"
        );

        Ok(Delivery {
            partition: record.partition,
            offset: offset.to_string(),
        })
    }
}
