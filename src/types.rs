//! Core types and events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Queue item protocol this crate acts on; usenet items are ignored.
pub const TORRENT: &str = "torrent";

/// Queue status reported by Sonarr/Radarr once a download has finished.
pub const COMPLETED: &str = "Completed";

/// Media manager that owns a queue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Application {
    /// Sonarr (series)
    Sonarr,
    /// Radarr (movies)
    Radarr,
}

impl fmt::Display for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Application::Sonarr => f.write_str("Sonarr"),
            Application::Radarr => f.write_str("Radarr"),
        }
    }
}

/// Lifecycle status of an extraction record.
///
/// The declaration order is the progression order and the derived `Ord`
/// gates behaviour:
///
/// `Queued < Extracting < ExtractFailed < Extracted < Imported < Deleted < Finished`
///
/// `ExtractFailed` sits below `Extracted` so a failed extraction is never
/// advanced towards import, and below `Deleted` so it is never reaped.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ExtractStatus {
    /// Waiting to be extracted
    #[default]
    Queued,
    /// Archiver is running
    Extracting,
    /// Archiver reported an error
    ExtractFailed,
    /// Files extracted, waiting for the media manager to import them
    Extracted,
    /// Media manager imported the download; delete delay is running
    Imported,
    /// Extracted files were removed from disk
    Deleted,
    /// Record was reaped from history
    Finished,
}

impl fmt::Display for ExtractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExtractStatus::Queued => "Queued",
            ExtractStatus::Extracting => "Extracting",
            ExtractStatus::ExtractFailed => "Extract Failed",
            ExtractStatus::Extracted => "Extracted",
            ExtractStatus::Imported => "Imported",
            ExtractStatus::Deleted => "Deleted",
            ExtractStatus::Finished => "Finished",
        };
        f.write_str(s)
    }
}

/// One tracked download, keyed by its name in the history store
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// Download title (unique key)
    pub name: String,
    /// Media manager that owns the download
    pub application: Application,
    /// Directory the archives were found in
    pub path: PathBuf,
    /// Current lifecycle status
    pub status: ExtractStatus,
    /// Archive members while extracting, extracted files once extracted
    pub files: Vec<PathBuf>,
    /// Time of the last status change
    pub updated: DateTime<Utc>,
}

impl ExtractionRecord {
    /// New record for an extraction that is about to start
    pub fn new(
        name: impl Into<String>,
        application: Application,
        path: PathBuf,
        files: Vec<PathBuf>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            application,
            path,
            status: ExtractStatus::Extracting,
            files,
            updated: now,
        }
    }

    /// Time since the last status change, clamped at zero if the clock went backwards
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.updated)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Move forward to `status`, stamping `updated`.
    ///
    /// Returns `false` and leaves the record untouched when `status` is not
    /// ahead of the current one.
    pub fn advance_to(&mut self, status: ExtractStatus, now: DateTime<Utc>) -> bool {
        if status <= self.status {
            return false;
        }
        self.status = status;
        self.updated = now;
        true
    }
}

/// Episode metadata attached to Sonarr queue items
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Episode title
    #[serde(default)]
    pub title: String,
}

/// Read-only entry from a media manager's download queue
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    /// Download title
    #[serde(default)]
    pub title: String,
    /// Free-form status, e.g. "Completed" or "Downloading"
    #[serde(default)]
    pub status: String,
    /// Download protocol, e.g. "torrent" or "usenet"
    #[serde(default)]
    pub protocol: String,
    /// Total size in bytes
    #[serde(default)]
    pub size: f64,
    /// Bytes remaining
    #[serde(default, rename = "sizeleft")]
    pub size_left: f64,
    /// Episode metadata (Sonarr only)
    #[serde(default)]
    pub episode: Option<Episode>,
}

impl QueueItem {
    /// Whether this item is a finished torrent download
    pub fn is_completed_torrent(&self) -> bool {
        self.status == COMPLETED && self.protocol == TORRENT
    }

    /// Whether a live item with this protocol belongs to something other than a torrent
    pub fn is_foreign_protocol(&self) -> bool {
        self.protocol != TORRENT && !self.protocol.is_empty()
    }

    /// Download progress in whole percent; zero when the size is unknown
    pub fn progress_percent(&self) -> u32 {
        if self.size <= 0.0 {
            return 0;
        }
        (100.0 - (self.size_left / self.size * 100.0)).clamp(0.0, 100.0) as u32
    }
}

/// Per-status record counts, logged once per cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Records in `Extracting`
    pub extracting: u64,
    /// Records in `Queued`
    pub queued: u64,
    /// Records in `Extracted`
    pub extracted: u64,
    /// Records in `Imported`
    pub imported: u64,
    /// Records in `ExtractFailed`
    pub failed: u64,
    /// Records in `Deleted`
    pub deleted: u64,
    /// Records reaped since startup
    pub finished: u64,
}

impl StatusCounts {
    /// Count one record with the given status
    pub(crate) fn add(&mut self, status: ExtractStatus) {
        match status {
            ExtractStatus::Queued => self.queued += 1,
            ExtractStatus::Extracting => self.extracting += 1,
            ExtractStatus::ExtractFailed => self.failed += 1,
            ExtractStatus::Extracted => self.extracted += 1,
            ExtractStatus::Imported => self.imported += 1,
            ExtractStatus::Deleted | ExtractStatus::Finished => self.deleted += 1,
        }
    }
}

impl fmt::Display for StatusCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} extracting, {} queued, {} extracted, {} imported, {} failed, {} deleted. Finished: {}",
            self.extracting,
            self.queued,
            self.extracted,
            self.imported,
            self.failed,
            self.deleted,
            self.finished
        )
    }
}

/// Event emitted on every record transition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A completed download with archives was found and extraction started
    ExtractionStarted {
        /// Download name
        name: String,
        /// Owning application
        application: Application,
        /// Number of archives handed to the archiver
        archives: usize,
    },

    /// Extraction finished successfully
    Extracted {
        /// Download name
        name: String,
        /// Number of extracted files
        files: usize,
    },

    /// Extraction failed; the record will not be retried
    ExtractionFailed {
        /// Download name
        name: String,
        /// Error message
        error: String,
    },

    /// The download left the live queue and is considered imported
    Imported {
        /// Download name
        name: String,
    },

    /// Extracted files were handed to the deleter
    Deleted {
        /// Download name
        name: String,
        /// Number of files deleted
        files: usize,
    },

    /// Record removed from history
    Finished {
        /// Download name
        name: String,
    },

    /// The unpacker is shutting down
    Shutdown,
}
