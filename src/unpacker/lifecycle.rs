//! Startup and shutdown coordination.

use super::Unpacker;
use crate::error::{Error, Result};
use crate::types::Event;

impl Unpacker {
    /// Spawn the queue poller and the lifecycle scheduler
    ///
    /// The poller fetches immediately; the first lifecycle pass runs one
    /// `interval` later. Calling `start` on a running unpacker does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShuttingDown`] once [`shutdown`](Self::shutdown) has been called.
    pub async fn start(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::ShuttingDown);
        }

        let mut loops = self.loops.lock().await;
        if !loops.is_empty() {
            tracing::debug!("unpacker already started");
            return Ok(());
        }

        loops.push(tokio::spawn(self.poller().run(self.cancel.clone())));
        loops.push(tokio::spawn(self.scheduler().run(self.cancel.clone())));

        tracing::info!(
            apps = self.config.applications.len(),
            "unpacker started"
        );
        Ok(())
    }

    /// Stop both loops and, if configured, wait for in-flight work
    ///
    /// Extractions and deletions already dispatched are not cancelled. With a
    /// non-zero `shutdown_drain` this waits up to that long for them to
    /// finish; otherwise they are abandoned to the runtime.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.cancel.cancel();

        let handles: Vec<_> = self.loops.lock().await.drain(..).collect();
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "background loop ended abnormally");
            }
        }
        tracing::info!("Stopped queue poller and cleanup routine");

        let tasks = self.tracker.tasks();
        tasks.close();
        let drain = self.config.shutdown_drain;
        if !drain.is_zero() && !tasks.is_empty() {
            match tokio::time::timeout(drain, tasks.wait()).await {
                Ok(()) => tracing::info!("All in-flight extractions and deletions completed"),
                Err(_) => tracing::warn!(
                    remaining = tasks.len(),
                    "Timeout waiting for in-flight work, proceeding with shutdown"
                ),
            }
        }

        self.tracker.emit(Event::Shutdown);

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }
}
