//! Name-keyed table of extraction records
//!
//! The store is the only owner of the records. Enumeration clones a snapshot
//! under the read lock; every mutation takes the write lock for exactly one
//! record, so callers that act on a stale snapshot must re-check the status
//! inside [`HistoryStore::update`] before changing anything.

use crate::types::{ExtractStatus, ExtractionRecord, StatusCounts};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// In-process history of tracked extractions
#[derive(Debug, Default)]
pub struct HistoryStore {
    records: RwLock<HashMap<String, ExtractionRecord>>,
    /// Records reaped since startup
    finished: AtomicU64,
}

impl HistoryStore {
    /// Empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the record for `name`
    pub async fn get(&self, name: &str) -> Option<ExtractionRecord> {
        self.records.read().await.get(name).cloned()
    }

    /// Whether a record exists for `name`
    pub async fn contains(&self, name: &str) -> bool {
        self.records.read().await.contains_key(name)
    }

    /// Number of tracked records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether nothing is tracked
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Store `record` unless its name is already tracked.
    ///
    /// Returns `true` when the record was inserted. The existence check and
    /// the insert share one write lock, so of several concurrent callers for
    /// the same name exactly one wins.
    pub async fn insert_if_absent(&self, record: ExtractionRecord) -> bool {
        match self.records.write().await.entry(record.name.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    /// Clone of every record, taken under the read lock
    pub async fn snapshot(&self) -> Vec<ExtractionRecord> {
        self.records.read().await.values().cloned().collect()
    }

    /// Run `f` against the record for `name` under the write lock.
    ///
    /// Returns `None` if the record no longer exists.
    pub async fn update<R>(
        &self,
        name: &str,
        f: impl FnOnce(&mut ExtractionRecord) -> R,
    ) -> Option<R> {
        self.records.write().await.get_mut(name).map(f)
    }

    /// Remove the record for `name` if it was deleted at least `min_age` ago.
    ///
    /// The removed record comes back marked `Finished`. A second call for the
    /// same name finds nothing and returns `None`, leaving the counter alone.
    pub async fn reap(
        &self,
        name: &str,
        min_age: Duration,
        now: DateTime<Utc>,
    ) -> Option<ExtractionRecord> {
        let mut records = self.records.write().await;
        let ready = records
            .get(name)
            .is_some_and(|r| r.status >= ExtractStatus::Deleted && r.elapsed(now) >= min_age);
        if !ready {
            return None;
        }

        let mut record = records.remove(name)?;
        self.finished.fetch_add(1, Ordering::Relaxed);
        record.status = ExtractStatus::Finished;
        record.updated = now;
        Some(record)
    }

    /// Records reaped since startup
    pub fn finished(&self) -> u64 {
        self.finished.load(Ordering::Relaxed)
    }

    /// Per-status counts of the current records
    pub async fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts {
            finished: self.finished(),
            ..Default::default()
        };
        for record in self.records.read().await.values() {
            counts.add(record.status);
        }
        counts
    }
}
