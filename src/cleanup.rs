//! Removal of extracted files once the delete delay has passed

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Deletes files from disk, best effort
///
/// Failures are logged by the implementation and never reported back; a
/// record is marked deleted regardless. The same files may be passed twice.
#[async_trait]
pub trait Deleter: Send + Sync {
    /// Remove every path in `files`
    async fn delete(&self, files: &[PathBuf]);
}

/// Deleter backed by `tokio::fs`; directories are removed recursively
#[derive(Debug, Clone, Default)]
pub struct FsDeleter;

#[async_trait]
impl Deleter for FsDeleter {
    async fn delete(&self, files: &[PathBuf]) {
        use tokio::fs;

        let mut deleted = 0usize;
        for file in files {
            let result = match fs::symlink_metadata(file).await {
                Ok(meta) if meta.is_dir() => fs::remove_dir_all(file).await,
                Ok(_) => fs::remove_file(file).await,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(?file, "already gone");
                    continue;
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => {
                    debug!(?file, "deleted");
                    deleted += 1;
                }
                Err(e) => warn!(?file, error = %e, "failed to delete extracted file"),
            }
        }

        info!(deleted, requested = files.len(), "deleted extracted files");
    }
}
