//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use livescore_tracker::{
    assemble, BusError, BusRecord, Components, Delivery, MessageBus, RetryPolicy, ScoreResult,
    ScoreSource, SourceError, TrackerConfig, UpdateMessage,
};

type Reply = Result<Option<ScoreResult>, SourceError>;

/// Score source answering from per-event scripts.
///
/// Once a script runs dry the event keeps its fallback reply, if any, or
/// returns no data.
#[derive(Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    fallbacks: Mutex<HashMap<String, Reply>>,
    calls: Mutex<HashMap<String, u32>>,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, event_id: &str, reply: Reply) {
        self.scripts
            .lock()
            .expect("lock")
            .entry(event_id.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn always(&self, event_id: &str, reply: Reply) {
        self.fallbacks
            .lock()
            .expect("lock")
            .insert(event_id.to_string(), reply);
    }

    pub fn calls(&self, event_id: &str) -> u32 {
        self.calls
            .lock()
            .expect("lock")
            .get(event_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl ScoreSource for ScriptedSource {
    async fn fetch_score(&self, event_id: &str) -> Reply {
        *self
            .calls
            .lock()
            .expect("lock")
            .entry(event_id.to_string())
            .or_default() += 1;

        let scripted = self
            .scripts
            .lock()
            .expect("lock")
            .get_mut(event_id)
            .and_then(VecDeque::pop_front);
        if let Some(reply) = scripted {
            return reply;
        }

        self.fallbacks
            .lock()
            .expect("lock")
            .get(event_id)
            .cloned()
            .unwrap_or(Ok(None))
    }
}

/// Bus that records every record it acknowledges.
#[derive(Default)]
pub struct RecordingBus {
    records: Mutex<Vec<BusRecord>>,
    failing_keys: Mutex<Vec<String>>,
}

impl RecordingBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_for(&self, key: &str) {
        self.failing_keys.lock().expect("lock").push(key.to_string());
    }

    pub fn records(&self) -> Vec<BusRecord> {
        self.records.lock().expect("lock").clone()
    }

    pub fn messages_for(&self, key: &str) -> Vec<UpdateMessage> {
        self.records()
            .into_iter()
            .filter(|r| r.key == key)
            .map(|r| serde_json::from_str(&r.payload).expect("payload"))
            .collect()
    }
}

#[async_trait]
impl MessageBus for RecordingBus {
    async fn send(&self, record: BusRecord) -> Result<Delivery, BusError> {
        if self.failing_keys.lock().expect("lock").contains(&record.key) {
            return Err(BusError::Unavailable("broker down".to_string()));
        }

        let mut records = self.records.lock().expect("lock");
        records.push(record.clone());
        Ok(Delivery {
            partition: record.partition,
            offset: records.len().to_string(),
        })
    }
}

/// A transient failure.
pub fn transient() -> Reply {
    Err(SourceError::Transient("connection timed out".to_string()))
}

/// A successful reply.
pub fn score(event_id: &str, score: &str) -> Reply {
    Ok(Some(ScoreResult::new(event_id, score)))
}

/// Wires the core over the doubles with the default retry policy.
pub fn harness() -> (Components, Arc<ScriptedSource>, Arc<RecordingBus>) {
    harness_with(RetryPolicy::default())
}

/// Wires the core over the doubles with the given retry policy.
pub fn harness_with(policy: RetryPolicy) -> (Components, Arc<ScriptedSource>, Arc<RecordingBus>) {
    let source = ScriptedSource::new();
    let bus = RecordingBus::new();
    let config = TrackerConfig::default().with_retry(policy);

    let components = assemble(&config, source.clone(), bus.clone());
    (components, source, bus)
}
