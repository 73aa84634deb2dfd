//! Top-level handle wiring configuration, stores, collaborators and loops.
//!
//! - [`lifecycle`] - starting the loops and graceful shutdown
//!
//! An [`Unpacker`] owns one [`HistoryStore`], one [`QueueCache`], and the
//! collaborators that act on the filesystem. [`Unpacker::new`] uses the
//! real ones (unrar, the filesystem, the Sonarr/Radarr HTTP API);
//! [`Unpacker::builder`] lets embedders and tests swap any of them.

mod lifecycle;


use crate::cleanup::{Deleter, FsDeleter};
use crate::config::Config;
use crate::error::Result;
use crate::extraction::{ArchiveLocator, Archiver, RarArchiver, RarLocator};
use crate::history::HistoryStore;
use crate::queue_cache::QueueCache;
use crate::queue_poller::QueuePoller;
use crate::scheduler::Scheduler;
use crate::starr::{QueueSource, StarrClient};
use crate::tracker::{Collaborators, Tracker};
use crate::types::{Application, Event, ExtractionRecord, QueueItem, StatusCounts};
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Capacity of the lifecycle event channel; slow subscribers see `Lagged`
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Main unpacker instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Unpacker {
    /// Validated configuration
    pub(crate) config: Arc<Config>,
    /// Lifecycle state and the per-record task group
    pub(crate) tracker: Tracker,
    /// Where the poller fetches queues from
    pub(crate) source: Arc<dyn QueueSource>,
    /// Stops both loops
    pub(crate) cancel: CancellationToken,
    /// Join handles of the running loops (empty until `start`)
    pub(crate) loops: Arc<Mutex<Vec<JoinHandle<()>>>>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
}

/// Builder for an [`Unpacker`] with replaceable collaborators
pub struct UnpackerBuilder {
    config: Config,
    source: Option<Arc<dyn QueueSource>>,
    locator: Option<Arc<dyn ArchiveLocator>>,
    archiver: Option<Arc<dyn Archiver>>,
    deleter: Option<Arc<dyn Deleter>>,
}

impl UnpackerBuilder {
    /// Fetch queues from `source` instead of the HTTP API
    pub fn queue_source(mut self, source: Arc<dyn QueueSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Find archives with `locator` instead of [`RarLocator`]
    pub fn locator(mut self, locator: Arc<dyn ArchiveLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Extract with `archiver` instead of [`RarArchiver`]
    pub fn archiver(mut self, archiver: Arc<dyn Archiver>) -> Self {
        self.archiver = Some(archiver);
        self
    }

    /// Delete with `deleter` instead of [`FsDeleter`]
    pub fn deleter(mut self, deleter: Arc<dyn Deleter>) -> Self {
        self.deleter = Some(deleter);
        self
    }

    /// Validate the configuration and assemble the unpacker
    ///
    /// Nothing runs until [`Unpacker::start`].
    pub fn build(self) -> Result<Unpacker> {
        let config = self.config;
        config.validate()?;

        let source: Arc<dyn QueueSource> = match self.source {
            Some(source) => source,
            None => Arc::new(StarrClient::new(&config.applications)?),
        };
        let collaborators = Collaborators {
            locator: self.locator.unwrap_or_else(|| Arc::new(RarLocator)),
            archiver: self.archiver.unwrap_or_else(|| Arc::new(RarArchiver)),
            deleter: self.deleter.unwrap_or_else(|| Arc::new(FsDeleter)),
        };

        let paths = config
            .applications
            .iter()
            .map(|a| (a.application, a.path.clone()))
            .collect();

        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let tracker = Tracker::new(
            Arc::new(HistoryStore::new()),
            Arc::new(QueueCache::new()),
            collaborators,
            paths,
            config.delete_delay,
            event_tx.clone(),
        );

        tracing::debug!(
            apps = ?config.application_list(),
            interval = ?config.interval,
            poll_interval = ?config.poll_interval,
            delete_delay = ?config.delete_delay,
            "unpacker configured"
        );

        Ok(Unpacker {
            config: Arc::new(config),
            tracker,
            source,
            cancel: CancellationToken::new(),
            loops: Arc::new(Mutex::new(Vec::new())),
            event_tx,
        })
    }
}

impl Unpacker {
    /// Unpacker with the default collaborators
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the configuration is
    /// invalid, or a network error if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Builder for an unpacker with some collaborators replaced
    pub fn builder(config: Config) -> UnpackerBuilder {
        UnpackerBuilder {
            config,
            source: None,
            locator: None,
            archiver: None,
            deleter: None,
        }
    }

    /// Subscribe to lifecycle events
    ///
    /// Events sent before this call are not replayed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use arr_unpacker::{Config, Event, Unpacker};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let unpacker = Unpacker::new(Config::default())?;
    /// let mut events = unpacker.subscribe();
    ///
    /// tokio::spawn(async move {
    ///     while let Ok(event) = events.recv().await {
    ///         if let Event::Deleted { name, files } = event {
    ///             println!("{name}: removed {files} extracted files");
    ///         }
    ///     }
    /// });
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The validated configuration
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Per-status counts of the tracked records
    pub async fn status_counts(&self) -> StatusCounts {
        self.tracker.history().counts().await
    }

    /// Copy of every tracked record
    pub async fn history(&self) -> Vec<ExtractionRecord> {
        self.tracker.history().snapshot().await
    }

    /// Latest cached queue of `application`
    pub async fn queue_cache(&self, application: Application) -> Arc<Vec<QueueItem>> {
        self.tracker.queues().snapshot(application).await
    }

    /// Lifecycle loop over this unpacker's state
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(
            self.tracker.clone(),
            self.config.application_list(),
            self.config.interval,
        )
    }

    /// Queue poller feeding this unpacker's cache
    pub fn poller(&self) -> QueuePoller {
        QueuePoller::new(
            self.source.clone(),
            self.tracker.queues().clone(),
            self.config.application_list(),
            self.config.poll_interval,
        )
    }
}
