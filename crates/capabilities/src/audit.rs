//! Bounded, time-windowed in-memory audit trail for tool events.
//!
//! Diagnostic only: the authoritative store is the external database. Entries older than
//! the window are dropped, and the oldest entries are dropped once capacity is reached.

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const DEFAULT_CAPACITY: usize = 1_000;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub kind: String,
    pub subject: String,
    pub recorded_at: String,
    pub detail: Value,
}

#[derive(Debug)]
struct Entry {
    at: Instant,
    record: AuditRecord,
}

#[derive(Debug)]
pub struct AuditLog {
    capacity: usize,
    window: Duration,
    entries: Mutex<VecDeque<Entry>>,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_WINDOW)
    }
}

impl AuditLog {
    #[must_use]
    pub fn new(capacity: usize, window: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            window,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn record(&self, kind: &str, subject: &str, detail: Value) {
        self.record_at(Instant::now(), Utc::now(), kind, subject, detail);
    }

    fn record_at(
        &self,
        at: Instant,
        wall: DateTime<Utc>,
        kind: &str,
        subject: &str,
        detail: Value,
    ) {
        let mut entries = self.entries.lock();
        Self::prune(&mut entries, self.window, Instant::now());
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(Entry {
            at,
            record: AuditRecord {
                kind: kind.to_string(),
                subject: subject.to_string(),
                recorded_at: wall.to_rfc3339_opts(SecondsFormat::Millis, true),
                detail,
            },
        });
    }

    /// Live records, oldest first, optionally filtered by kind.
    #[must_use]
    pub fn snapshot(&self, kind: Option<&str>) -> Vec<AuditRecord> {
        let mut entries = self.entries.lock();
        Self::prune(&mut entries, self.window, Instant::now());
        entries
            .iter()
            .filter(|e| kind.is_none_or(|k| e.record.kind == k))
            .map(|e| e.record.clone())
            .collect()
    }

    #[must_use]
    pub fn count(&self, kind: &str) -> usize {
        self.snapshot(Some(kind)).len()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    fn prune(entries: &mut VecDeque<Entry>, window: Duration, now: Instant) {
        // Entries are appended in time order, so expired ones sit at the front.
        while entries
            .front()
            .is_some_and(|e| now.saturating_duration_since(e.at) > window)
        {
            entries.pop_front();
        }
    }
}
