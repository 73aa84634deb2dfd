//! Periodic lifecycle pass
//!
//! Once per interval the scheduler runs, in order:
//!
//! 1. the advancement and reaping pass over history
//! 2. the detection pass over every configured application's queue
//!
//! Both passes only dispatch work; the loop never waits for the extraction
//! or deletion tasks they start. A [`CancellationToken`] stops the loop at the
//! next tick boundary.
//!
//! # Example
//!
//! ```no_run
//! use arr_unpacker::{Config, Unpacker};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let unpacker = Unpacker::new(Config::default())?;
//! let cancel = CancellationToken::new();
//!
//! let scheduler = unpacker.scheduler();
//! let handle = tokio::spawn(scheduler.run(cancel.clone()));
//!
//! cancel.cancel();
//! handle.await?;
//! # Ok(())
//! # }
//! ```

use crate::config::MAX_DURATION;
use crate::tracker::Tracker;
use crate::types::{Application, StatusCounts};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

/// Shortest tick period tokio will accept
pub(crate) const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Fixed-interval driver of the lifecycle passes
pub struct Scheduler {
    /// Lifecycle state the passes run against
    tracker: Tracker,

    /// Applications whose queues are scanned for completed downloads
    applications: Vec<Application>,

    /// Time between ticks
    interval: Duration,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Parameters
    /// - `tracker`: lifecycle state shared with the rest of the unpacker
    /// - `applications`: queues to scan each tick, in order
    /// - `interval`: time between ticks; the first tick fires one interval after `run` starts.
    ///   Clamped to `1ms..=MAX_DURATION`.
    pub fn new(tracker: Tracker, applications: Vec<Application>, interval: Duration) -> Self {
        Self {
            tracker,
            applications,
            interval: interval.clamp(MIN_INTERVAL, MAX_DURATION),
        }
    }

    /// One tick: advance and reap, then detect.
    pub async fn tick(&self, now: DateTime<Utc>) -> StatusCounts {
        let counts = self.tracker.check_extract_done(now).await;

        for &application in &self.applications {
            let dispatched = self.tracker.check_queue(application, now).await;
            debug!(app = %application, dispatched, "queue checked");
        }

        counts
    }

    /// Run ticks until `cancel` fires
    pub async fn run(self, cancel: CancellationToken) {
        info!(interval = ?self.interval, "starting cleanup routine");

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick(Utc::now()).await;
                }
            }
        }

        info!("cleanup routine stopped");
    }
}
