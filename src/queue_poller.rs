//! Periodic queue refresh
//!
//! Polls every configured application right away, then once per
//! `poll_interval`. A failed fetch is logged and the previous snapshot stays
//! in the cache until a later poll succeeds.

use crate::config::MAX_DURATION;
use crate::error::Result;
use crate::queue_cache::QueueCache;
use crate::scheduler::MIN_INTERVAL;
use crate::starr::QueueSource;
use crate::types::Application;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Keeps the [`QueueCache`] current
pub struct QueuePoller {
    source: Arc<dyn QueueSource>,
    cache: Arc<QueueCache>,
    applications: Vec<Application>,
    interval: Duration,
}

impl QueuePoller {
    /// Poller fetching `applications` from `source` into `cache`
    ///
    /// `interval` is clamped to `1ms..=MAX_DURATION`.
    pub fn new(
        source: Arc<dyn QueueSource>,
        cache: Arc<QueueCache>,
        applications: Vec<Application>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            cache,
            applications,
            interval: interval.clamp(MIN_INTERVAL, MAX_DURATION),
        }
    }

    /// Fetch one application's queue and swap it into the cache
    ///
    /// Returns the number of items now cached. On error the cache is untouched.
    pub async fn poll(&self, application: Application) -> Result<usize> {
        let items = self.source.fetch(application).await?;
        let count = items.len();
        self.cache.replace(application, items).await;
        info!("{application} Updated: {count} Items Queued");
        Ok(count)
    }

    /// Poll every application, logging failures
    pub async fn poll_all(&self) {
        for &application in &self.applications {
            if let Err(e) = self.poll(application).await {
                error!(app = %application, error = %e, "queue poll failed, keeping previous snapshot");
            }
        }
    }

    /// Poll until `cancel` fires; the first poll happens immediately
    pub async fn run(self, cancel: CancellationToken) {
        info!(interval = ?self.interval, apps = self.applications.len(), "starting queue poller");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.poll_all().await,
            }
        }

        info!("queue poller stopped");
    }
}
