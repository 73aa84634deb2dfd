//! Shared test helpers: in-memory collaborators and a ready-made tracker.

use crate::cleanup::Deleter;
use crate::error::{Error, Result};
use crate::extraction::{ArchiveLocator, Archiver};
use crate::history::HistoryStore;
use crate::queue_cache::QueueCache;
use crate::tracker::{Collaborators, Tracker};
use crate::types::{Application, Event, ExtractStatus, ExtractionRecord, QueueItem};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

/// Base download directory of every application in tests
pub(crate) const SONARR_PATH: &str = "/downloads/sonarr";
pub(crate) const RADARR_PATH: &str = "/downloads/radarr";

/// Locator that returns preset archives per directory
#[derive(Default)]
pub(crate) struct FakeLocator {
    archives: Mutex<HashMap<PathBuf, Vec<PathBuf>>>,
    pub(crate) calls: AtomicUsize,
}

impl FakeLocator {
    /// Make `count` archives appear under `dir`
    pub(crate) fn add(&self, dir: impl Into<PathBuf>, count: usize) -> Vec<PathBuf> {
        let dir = dir.into();
        let files: Vec<PathBuf> = (1..=count)
            .map(|i| dir.join(format!("archive.part{i}.rar")))
            .collect();
        self.archives.lock().unwrap().insert(dir, files.clone());
        files
    }
}

#[async_trait]
impl ArchiveLocator for FakeLocator {
    async fn find(&self, path: &Path) -> Vec<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.archives
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_default()
    }
}

/// Archiver that "extracts" one `.mkv` per archive, or fails on demand
#[derive(Default)]
pub(crate) struct FakeArchiver {
    pub(crate) fail: AtomicBool,
    pub(crate) calls: AtomicUsize,
}

impl FakeArchiver {
    /// Files the fake writes for `archives`
    pub(crate) fn outputs(archives: &[PathBuf]) -> Vec<PathBuf> {
        archives.iter().map(|a| a.with_extension("mkv")).collect()
    }
}

#[async_trait]
impl Archiver for FakeArchiver {
    async fn extract(
        &self,
        _name: &str,
        _path: &Path,
        archives: &[PathBuf],
    ) -> Result<Vec<PathBuf>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Extraction {
                archive: archives.first().cloned().unwrap_or_default(),
                reason: "CRC failed".into(),
            });
        }
        Ok(Self::outputs(archives))
    }
}

/// Deleter that records what it was asked to delete
#[derive(Default)]
pub(crate) struct RecordingDeleter {
    pub(crate) calls: Mutex<Vec<Vec<PathBuf>>>,
}

impl RecordingDeleter {
    pub(crate) fn calls(&self) -> Vec<Vec<PathBuf>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Deleter for RecordingDeleter {
    async fn delete(&self, files: &[PathBuf]) {
        self.calls.lock().unwrap().push(files.to_vec());
    }
}

/// Tracker plus handles on its fakes
pub(crate) struct TestTracker {
    pub(crate) tracker: Tracker,
    pub(crate) locator: Arc<FakeLocator>,
    pub(crate) archiver: Arc<FakeArchiver>,
    pub(crate) deleter: Arc<RecordingDeleter>,
    pub(crate) events: broadcast::Receiver<Event>,
}

impl TestTracker {
    /// Wait for every detached task spawned so far (and any they spawn)
    pub(crate) async fn drain(&self) {
        let tasks = self.tracker.tasks();
        tasks.close();
        tasks.wait().await;
        tasks.reopen();
    }

    /// Put a record directly into history
    pub(crate) async fn insert(
        &self,
        name: &str,
        application: Application,
        status: ExtractStatus,
        updated: DateTime<Utc>,
    ) -> ExtractionRecord {
        let path = base_path(application).join(name);
        let mut record = ExtractionRecord::new(
            name,
            application,
            path.clone(),
            vec![path.join(format!("{name}.mkv"))],
            updated,
        );
        record.status = status;
        assert!(
            self.tracker.history.insert_if_absent(record.clone()).await,
            "record {name} already present"
        );
        record
    }

    /// Current status of `name`, if tracked
    pub(crate) async fn status(&self, name: &str) -> Option<ExtractStatus> {
        self.tracker.history.get(name).await.map(|r| r.status)
    }

    /// Replace an application's queue
    pub(crate) async fn set_queue(&self, application: Application, items: Vec<QueueItem>) {
        self.tracker.queues.replace(application, items).await;
    }

    /// Events received so far
    pub(crate) fn take_events(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

pub(crate) fn base_path(application: Application) -> PathBuf {
    match application {
        Application::Sonarr => PathBuf::from(SONARR_PATH),
        Application::Radarr => PathBuf::from(RADARR_PATH),
    }
}

/// Queue item with the given status and protocol
pub(crate) fn queue_item(title: &str, status: &str, protocol: &str) -> QueueItem {
    QueueItem {
        title: title.into(),
        status: status.into(),
        protocol: protocol.into(),
        size: 1000.0,
        size_left: 0.0,
        episode: None,
    }
}

/// Tracker over fresh stores and fakes, with both applications configured
pub(crate) fn create_test_tracker(delete_delay: Duration) -> TestTracker {
    let locator = Arc::new(FakeLocator::default());
    let archiver = Arc::new(FakeArchiver::default());
    let deleter = Arc::new(RecordingDeleter::default());
    let (event_tx, events) = broadcast::channel(1000);

    let paths = HashMap::from([
        (Application::Sonarr, base_path(Application::Sonarr)),
        (Application::Radarr, base_path(Application::Radarr)),
    ]);

    let tracker = Tracker::new(
        Arc::new(HistoryStore::new()),
        Arc::new(QueueCache::new()),
        Collaborators {
            locator: locator.clone(),
            archiver: archiver.clone(),
            deleter: deleter.clone(),
        },
        paths,
        delete_delay,
        event_tx,
    );

    TestTracker {
        tracker,
        locator,
        archiver,
        deleter,
        events,
    }
}
