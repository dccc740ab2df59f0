//! Transient toast messages with per-message expiry.
//!
//! Expirations sit in a min-heap keyed by `(deadline, id)`, so an event loop
//! only ever needs to wait for `next_deadline()`. Removal is by id; a
//! message's lifetime never depends on its neighbours.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub const DEFAULT_TTL_MS: u64 = 4_000;

/// Millisecond wall clock.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

/// Test clock. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn at(now_ms: u64) -> Self {
        Self { now: Arc::new(AtomicU64::new(now_ms)) }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NotificationId(pub u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Success,
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub tone: Tone,
    pub pushed_at_ms: u64,
    pub expires_at_ms: u64,
}

pub struct NotificationQueue {
    clock: Arc<dyn Clock>,
    ttl_ms: u64,
    entries: Vec<Notification>,
    expirations: BinaryHeap<Reverse<(u64, NotificationId)>>,
    last_id: u64,
}

impl NotificationQueue {
    pub fn new(clock: Arc<dyn Clock>, ttl_ms: u64) -> Self {
        Self { clock, ttl_ms, entries: Vec::new(), expirations: BinaryHeap::new(), last_id: 0 }
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Ids are the push timestamp, bumped past the previous id when two
    /// pushes land in the same millisecond.
    pub fn push(&mut self, message: impl Into<String>, tone: Tone) -> NotificationId {
        let now = self.clock.now_ms();
        let id = NotificationId(now.max(self.last_id.saturating_add(1)));
        self.last_id = id.0;

        let expires_at_ms = now.saturating_add(self.ttl_ms);
        self.entries.insert(
            0,
            Notification { id, message: message.into(), tone, pushed_at_ms: now, expires_at_ms },
        );
        self.expirations.push(Reverse((expires_at_ms, id)));
        id
    }

    /// Removes every message whose deadline is at or before `now_ms` and
    /// returns the ids removed, earliest deadline first.
    pub fn expire_due(&mut self, now_ms: u64) -> Vec<NotificationId> {
        let mut expired = Vec::new();
        while let Some(Reverse((deadline, id))) = self.expirations.peek().copied() {
            if deadline > now_ms {
                break;
            }
            self.expirations.pop();
            if self.remove(id) {
                expired.push(id);
            }
        }
        self.prune();
        expired
    }

    pub fn expire_now(&mut self) -> Vec<NotificationId> {
        let now = self.clock.now_ms();
        self.expire_due(now)
    }

    /// Closes a message before its timer fires.
    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        let removed = self.remove(id);
        self.prune();
        removed
    }

    /// Messages still alive at `now_ms`, newest first. Expired messages are
    /// hidden even if `expire_due` has not run yet.
    pub fn visible(&self, now_ms: u64) -> Vec<&Notification> {
        self.entries.iter().filter(|entry| entry.expires_at_ms > now_ms).collect()
    }

    pub fn visible_now(&self) -> Vec<&Notification> {
        self.visible(self.clock.now_ms())
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.expirations.peek().map(|Reverse((deadline, _))| *deadline)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove(&mut self, id: NotificationId) -> bool {
        match self.entries.iter().position(|entry| entry.id == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    // Keeps the heap top pointing at a live message.
    fn prune(&mut self) {
        while let Some(Reverse((_, id))) = self.expirations.peek().copied() {
            if self.entries.iter().any(|entry| entry.id == id) {
                break;
            }
            self.expirations.pop();
        }
    }
}
