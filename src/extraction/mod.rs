//! Archive discovery and extraction
//!
//! Two seams: [`ArchiveLocator`] finds the archives inside a completed
//! download, and [`Archiver`] unpacks them. The RAR-backed defaults are
//! [`RarLocator`] and [`RarArchiver`].

mod rar;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use rar::{RarArchiver, RarLocator};

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Finds extractable archives in a download directory
#[async_trait]
pub trait ArchiveLocator: Send + Sync {
    /// Archives under `path`; empty when there are none or the path is unreadable
    async fn find(&self, path: &Path) -> Vec<PathBuf>;
}

/// Unpacks archives found by an [`ArchiveLocator`]
///
/// Extraction may be invoked twice for the same files if two passes race;
/// implementations must tolerate that.
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Extract `archives` belonging to download `name` into `path`.
    ///
    /// Returns the files written.
    async fn extract(&self, name: &str, path: &Path, archives: &[PathBuf])
    -> Result<Vec<PathBuf>>;
}
