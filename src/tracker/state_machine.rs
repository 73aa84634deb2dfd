//! Advancement of extracted records through import and deletion.

use crate::types::{Event, ExtractStatus, ExtractionRecord, QueueItem, StatusCounts};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use super::Tracker;

/// Outcome of evaluating one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Not in `Extracted..=Imported`, nothing to do here
    Ineligible,
    /// The record changed or vanished since it was enumerated
    Stale,
    /// Still listed with a status; the media manager has not imported it
    AwaitingImport,
    /// A non-torrent item shares the name; it is not ours
    Unrelated,
    /// Gone from the queue, now `Imported`
    Imported,
    /// Delete delay still running
    AwaitingDelete(Duration),
    /// Delete delay passed, now `Deleted`; these files go to the deleter
    Deleted(Vec<PathBuf>),
}

/// Decide the next step for `record` given its live queue entry, if any.
///
/// Pure: callers apply the result under the history write lock.
pub(crate) fn next_step(
    record: &ExtractionRecord,
    live: Option<&QueueItem>,
    delete_delay: Duration,
    now: DateTime<Utc>,
) -> Advance {
    if record.status < ExtractStatus::Extracted || record.status > ExtractStatus::Imported {
        return Advance::Ineligible;
    }

    if let Some(item) = live {
        if !item.status.is_empty() {
            return Advance::AwaitingImport;
        }
        if item.is_foreign_protocol() {
            return Advance::Unrelated;
        }
    }

    if record.status != ExtractStatus::Imported {
        return Advance::Imported;
    }

    let elapsed = record.elapsed(now);
    if elapsed >= delete_delay {
        Advance::Deleted(record.files.clone())
    } else {
        Advance::AwaitingDelete(delete_delay - elapsed)
    }
}

impl Tracker {
    /// One pass over history: reap long-deleted records and dispatch the
    /// extracted/imported ones for advancement.
    ///
    /// Returns the status counts as they stood when the pass was dispatched.
    pub async fn check_extract_done(&self, now: DateTime<Utc>) -> StatusCounts {
        let reap_after = self.reap_after();

        for record in self.history.snapshot().await {
            debug!(
                name = %record.name,
                status = %record.status,
                elapsed = ?record.elapsed(now),
                "extract status"
            );

            if record.status >= ExtractStatus::Deleted && record.elapsed(now) >= reap_after {
                let tracker = self.clone();
                self.spawn(async move {
                    tracker.finish(&record.name, now).await;
                });
            } else if record.status < ExtractStatus::Extracted
                || record.status > ExtractStatus::Imported
            {
                continue;
            } else {
                let tracker = self.clone();
                self.spawn(async move {
                    tracker.handle_extract_done(record, now).await;
                });
            }
        }

        let counts = self.history.counts().await;
        info!("Extract Statuses: {}", counts);
        counts
    }

    /// Advance one record observed in state `observed.status`.
    ///
    /// Re-checks the status under the write lock; if another task already
    /// moved the record the call is a no-op.
    pub async fn handle_extract_done(
        &self,
        observed: ExtractionRecord,
        now: DateTime<Utc>,
    ) -> Advance {
        let app = observed.application;
        let name = observed.name.as_str();
        let live = self.queues.find_item(app, name).await;

        let outcome = self
            .history
            .update(name, |record| {
                if record.status != observed.status {
                    return Advance::Stale;
                }
                let step = next_step(record, live.as_ref(), self.delete_delay, now);
                match &step {
                    Advance::Imported => {
                        record.advance_to(ExtractStatus::Imported, now);
                    }
                    Advance::Deleted(_) => {
                        record.advance_to(ExtractStatus::Deleted, now);
                    }
                    _ => {}
                }
                step
            })
            .await
            .unwrap_or(Advance::Stale);

        match &outcome {
            Advance::AwaitingImport => {
                if let Some(item) = &live {
                    debug!(
                        app = %app,
                        protocol = %item.protocol,
                        status = %item.status,
                        name,
                        "item waiting for import"
                    );
                }
            }
            Advance::Imported => {
                info!(app = %app, name, delete_in = ?self.delete_delay, "imported");
                self.emit(Event::Imported {
                    name: name.to_string(),
                });
            }
            Advance::AwaitingDelete(remaining) => {
                debug!(app = %app, name, remaining = ?remaining, "awaiting delete delay");
            }
            Advance::Deleted(files) => {
                // Deleter runs outside the history lock
                self.collaborators.deleter.delete(files).await;
                info!(app = %app, name, files = files.len(), "deleted extracted files");
                self.emit(Event::Deleted {
                    name: name.to_string(),
                    files: files.len(),
                });
            }
            Advance::Ineligible | Advance::Stale | Advance::Unrelated => {}
        }

        outcome
    }
}
