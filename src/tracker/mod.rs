//! Extraction lifecycle tracking split into focused submodules.
//!
//! The [`Tracker`] struct and its methods are organized by stage:
//! - [`detector`] - finds completed torrents and starts extraction
//! - [`state_machine`] - advances extracted records to imported and deleted
//! - [`reaper`] - drops long-deleted records from history
//!
//! Every pass enumerates under a read lock and hands per-record work to
//! detached tasks on a shared [`TaskTracker`]. Those tasks take the write lock
//! for their one record and re-check its status before touching it, so a
//! duplicate dispatch is a no-op.

mod detector;
mod reaper;
mod state_machine;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use detector::Detection;
pub use state_machine::Advance;

use crate::cleanup::Deleter;
use crate::extraction::{ArchiveLocator, Archiver};
use crate::history::HistoryStore;
use crate::queue_cache::QueueCache;
use crate::types::{Application, Event};
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::task::TaskTracker;

/// External collaborators the tracker drives
#[derive(Clone)]
pub struct Collaborators {
    /// Finds archives in a completed download
    pub locator: Arc<dyn ArchiveLocator>,
    /// Extracts the archives
    pub archiver: Arc<dyn Archiver>,
    /// Removes extracted files after import
    pub deleter: Arc<dyn Deleter>,
}

/// Shared state of the extraction lifecycle (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Tracker {
    /// Tracked extraction records
    pub(crate) history: Arc<HistoryStore>,
    /// Latest queue snapshot per application
    pub(crate) queues: Arc<QueueCache>,
    /// Locator, archiver and deleter
    pub(crate) collaborators: Collaborators,
    /// Download base directory per application
    pub(crate) paths: Arc<HashMap<Application, PathBuf>>,
    /// Grace period between import and deletion
    pub(crate) delete_delay: Duration,
    /// Detached per-record tasks
    pub(crate) tasks: TaskTracker,
    /// Lifecycle event broadcast
    pub(crate) event_tx: broadcast::Sender<Event>,
}

impl Tracker {
    /// Build a tracker over the given stores
    pub fn new(
        history: Arc<HistoryStore>,
        queues: Arc<QueueCache>,
        collaborators: Collaborators,
        paths: HashMap<Application, PathBuf>,
        delete_delay: Duration,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            history,
            queues,
            collaborators,
            paths: Arc::new(paths),
            delete_delay,
            tasks: TaskTracker::new(),
            event_tx,
        }
    }

    /// Tracked extraction records
    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Latest queue snapshots
    pub fn queues(&self) -> &Arc<QueueCache> {
        &self.queues
    }

    /// Handle group of detached tasks, for best-effort draining at shutdown
    pub fn tasks(&self) -> &TaskTracker {
        &self.tasks
    }

    /// Grace period between import and deletion
    pub fn delete_delay(&self) -> Duration {
        self.delete_delay
    }

    /// Age a deleted record must reach before it is reaped: twice the delete
    /// delay, saturating at `Duration::MAX`
    pub fn reap_after(&self) -> Duration {
        self.delete_delay.checked_mul(2).unwrap_or(Duration::MAX)
    }

    /// Run `work` as a detached task; the caller never awaits it
    pub(crate) fn spawn<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(work);
    }

    pub(crate) fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}
