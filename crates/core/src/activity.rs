use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityOutcome {
    Success,
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub event_id: String,
    pub record_id: String,
    pub correlation_id: String,
    pub event_type: String,
    pub outcome: ActivityOutcome,
    pub message: String,
    pub metadata: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(
        record_id: impl Into<String>,
        correlation_id: impl Into<String>,
        event_type: impl Into<String>,
        outcome: ActivityOutcome,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            record_id: record_id.into(),
            correlation_id: correlation_id.into(),
            event_type: event_type.into(),
            outcome,
            message: message.into(),
            metadata: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

pub trait ActivitySink: Send + Sync {
    fn emit(&self, entry: ActivityEntry);
    fn entries(&self) -> Vec<ActivityEntry>;
}

#[derive(Clone, Default)]
pub struct InMemoryActivitySink {
    entries: Arc<Mutex<Vec<ActivityEntry>>>,
}

impl ActivitySink for InMemoryActivitySink {
    fn emit(&self, entry: ActivityEntry) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }

    fn entries(&self) -> Vec<ActivityEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
