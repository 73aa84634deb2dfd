//! # arr-unpacker
//!
//! Extracts completed torrent downloads for Sonarr and Radarr, then cleans up
//! the extracted files once the media manager has imported them.
//!
//! ## How it works
//!
//! Torrents have to keep seeding their original `.rar` sets, so the media
//! manager cannot unpack them in place. arr-unpacker watches each
//! application's download queue and, for every completed torrent:
//!
//! 1. finds the first volume of each RAR set in the download directory
//! 2. extracts it next to the archives
//! 3. waits until the item leaves the queue (imported)
//! 4. deletes the extracted files after `delete_delay`, leaving the archives seeding
//! 5. forgets the record after twice that delay
//!
//! Every transition is broadcast as an [`Event`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use arr_unpacker::{Application, Config, StarrConfig, Unpacker, run_with_shutdown};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut sonarr = StarrConfig::new(
//!         Application::Sonarr,
//!         "http://localhost:8989",
//!         "/downloads/sonarr",
//!     );
//!     sonarr.api_key = "0123456789abcdef".to_string();
//!
//!     let config = Config {
//!         applications: vec![sonarr],
//!         ..Default::default()
//!     };
//!
//!     let unpacker = Unpacker::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = unpacker.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     unpacker.start().await?;
//!     run_with_shutdown(unpacker).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Deleting extracted files
pub mod cleanup;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Archive discovery and extraction
pub mod extraction;
/// Extraction history store
pub mod history;
/// Cached download queues
pub mod queue_cache;
/// Periodic queue refresh
pub mod queue_poller;
/// Periodic lifecycle pass
pub mod scheduler;
/// Sonarr/Radarr queue API client
pub mod starr;
/// Extraction lifecycle (decomposed into focused submodules)
pub mod tracker;
/// Core types and events
pub mod types;
/// Top-level unpacker handle
pub mod unpacker;

// Re-export commonly used types
pub use cleanup::{Deleter, FsDeleter};
pub use config::{Config, StarrConfig};
pub use error::{Error, Result};
pub use extraction::{ArchiveLocator, Archiver, RarArchiver, RarLocator};
pub use history::HistoryStore;
pub use queue_cache::QueueCache;
pub use queue_poller::QueuePoller;
pub use scheduler::Scheduler;
pub use starr::{QueueSource, StarrClient};
pub use tracker::{Advance, Collaborators, Detection, Tracker};
pub use types::{
    Application, Event, ExtractStatus, ExtractionRecord, QueueItem, StatusCounts,
};
pub use unpacker::{Unpacker, UnpackerBuilder};

/// Helper function to run the unpacker with graceful signal handling.
///
/// Waits for a termination signal and then calls the unpacker's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use arr_unpacker::{Config, Unpacker, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let unpacker = Unpacker::new(Config::from_json_file("unpacker.json")?)?;
///     unpacker.start().await?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(unpacker).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(unpacker: Unpacker) -> Result<()> {
    wait_for_signal().await;
    unpacker.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM signal"),
                _ = sigint.recv() => tracing::info!("Received SIGINT signal (Ctrl+C)"),
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C signal"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C signal"),
    }
}
