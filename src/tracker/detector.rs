//! Detection of completed torrent downloads that need extracting.

use crate::types::{Application, Event, ExtractStatus, ExtractionRecord};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use super::Tracker;

/// What a detection attempt did for one queue item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// A record was created and extraction of this many archives started
    Started(usize),
    /// A record already exists for the name
    AlreadyTracked,
    /// No archives at the download path (yet)
    NoArchives,
}

impl Tracker {
    /// Dispatch every completed torrent in `application`'s queue snapshot.
    ///
    /// Returns how many items were handed to background detection.
    pub async fn check_queue(&self, application: Application, now: DateTime<Utc>) -> usize {
        let Some(base) = self.paths.get(&application).cloned() else {
            warn!(app = %application, "no download path configured, skipping queue");
            return 0;
        };

        let items = self.queues.snapshot(application).await;
        let mut dispatched = 0;

        for item in items.iter() {
            if !item.is_completed_torrent() {
                debug!(
                    app = %application,
                    status = %item.status,
                    protocol = %item.protocol,
                    progress = item.progress_percent(),
                    episode = item.episode.as_ref().map(|e| e.title.as_str()).unwrap_or(""),
                    "{}",
                    item.title
                );
                continue;
            }

            let tracker = self.clone();
            let name = item.title.clone();
            let path = base.join(&item.title);
            self.spawn(async move {
                tracker
                    .handle_completed(application, &name, path, now)
                    .await;
            });
            dispatched += 1;
        }

        dispatched
    }

    /// Start extraction for a completed download unless its name is already tracked
    pub async fn handle_completed(
        &self,
        application: Application,
        name: &str,
        path: PathBuf,
        now: DateTime<Utc>,
    ) -> Detection {
        if self.history.contains(name).await {
            return Detection::AlreadyTracked;
        }

        let archives = self.collaborators.locator.find(&path).await;
        if archives.is_empty() {
            debug!(
                app = %application,
                name,
                ?path,
                "completed item still in queue, no extractable files found"
            );
            return Detection::NoArchives;
        }

        let record =
            ExtractionRecord::new(name, application, path.clone(), archives.clone(), now);
        if !self.history.insert_if_absent(record).await {
            // Another task won the race for this name
            return Detection::AlreadyTracked;
        }

        let count = archives.len();
        info!(
            app = %application,
            name,
            ?path,
            archives = count,
            "found extractable item(s)"
        );
        self.emit(Event::ExtractionStarted {
            name: name.to_string(),
            application,
            archives: count,
        });

        let tracker = self.clone();
        let name = name.to_string();
        self.spawn(async move {
            tracker.run_extraction(name, path, archives).await;
        });

        Detection::Started(count)
    }

    /// Extract and feed the outcome back into history
    async fn run_extraction(&self, name: String, path: PathBuf, archives: Vec<PathBuf>) {
        let result = self
            .collaborators
            .archiver
            .extract(&name, &path, &archives)
            .await;

        match result {
            Ok(files) => {
                let count = files.len();
                let applied = self
                    .history
                    .update(&name, |record| {
                        if record.advance_to(ExtractStatus::Extracted, Utc::now()) {
                            record.files = files;
                            true
                        } else {
                            false
                        }
                    })
                    .await
                    .unwrap_or(false);

                if applied {
                    info!(name = %name, files = count, "extracted");
                    self.emit(Event::Extracted { name, files: count });
                }
            }
            Err(e) => {
                error!(name = %name, error = %e, "extraction failed");
                let applied = self
                    .history
                    .update(&name, |record| {
                        record.advance_to(ExtractStatus::ExtractFailed, Utc::now())
                    })
                    .await
                    .unwrap_or(false);

                if applied {
                    self.emit(Event::ExtractionFailed {
                        name,
                        error: e.to_string(),
                    });
                }
            }
        }
    }
}
