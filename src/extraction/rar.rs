use crate::error::{Error, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

use super::{ArchiveLocator, Archiver};

/// `name.partN.rar` volumes; only the first volume is handed to unrar
static PART_VOLUME: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(?i)\.part0*(\d+)\.rar$"));

/// Locates RAR archives, descending into subdirectories
#[derive(Debug, Clone, Default)]
pub struct RarLocator;

impl RarLocator {
    /// Whether `file_name` is an archive unrar should be pointed at.
    ///
    /// Plain `.rar` files qualify. Of a `.partN.rar` set only part 1 does,
    /// since unrar follows the remaining volumes on its own.
    pub fn is_first_volume(file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        if !lower.ends_with(".rar") {
            return false;
        }
        match PART_VOLUME.as_ref() {
            Ok(re) => match re.captures(&lower) {
                Some(caps) => caps.get(1).is_some_and(|n| n.as_str() == "1"),
                None => true,
            },
            Err(_) => true,
        }
    }

    fn collect(dir: &Path, found: &mut Vec<PathBuf>) -> std::io::Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                Self::collect(&path, found)?;
            } else if Self::is_first_volume(&entry.file_name().to_string_lossy()) {
                found.push(path);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ArchiveLocator for RarLocator {
    async fn find(&self, path: &Path) -> Vec<PathBuf> {
        let dir = path.to_path_buf();
        let result = spawn_blocking(move || {
            let mut found = Vec::new();
            Self::collect(&dir, &mut found).map(|()| found)
        })
        .await;

        match result {
            Ok(Ok(found)) => {
                debug!(?path, count = found.len(), "located RAR archives");
                found
            }
            Ok(Err(e)) => {
                debug!(?path, error = %e, "could not scan download directory");
                Vec::new()
            }
            Err(e) => {
                warn!(?path, error = %e, "archive scan task panicked");
                Vec::new()
            }
        }
    }
}

/// Extracts RAR archives with the `unrar` crate, next to the archive
#[derive(Debug, Clone, Default)]
pub struct RarArchiver;

impl RarArchiver {
    /// Extract one archive (and its follow-up volumes) into `dest_path`
    pub fn extract_one(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "extracting RAR archive");

        std::fs::create_dir_all(dest_path)?;

        let mut at_header = unrar::Archive::new(archive_path)
            .open_for_processing()
            .map_err(|e| Self::extraction_error(archive_path, e))?;

        let mut extracted = Vec::new();
        loop {
            let at_file = match at_header.read_header() {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => return Err(Self::extraction_error(archive_path, e)),
            };
            let header = at_file.entry();

            // Strip "..", roots and prefixes so entries stay inside dest_path
            let relative: PathBuf = Path::new(&header.filename)
                .components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .collect();

            if header.is_directory() || relative.as_os_str().is_empty() {
                at_header = at_file
                    .skip()
                    .map_err(|e| Self::extraction_error(archive_path, e))?;
                continue;
            }

            let target = dest_path.join(&relative);
            at_header = at_file
                .extract_to(&target)
                .map_err(|e| Self::extraction_error(archive_path, e))?;
            extracted.push(target);
        }

        Ok(extracted)
    }

    fn extraction_error(archive_path: &Path, e: unrar::error::UnrarError) -> Error {
        Error::Extraction {
            archive: archive_path.to_path_buf(),
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl Archiver for RarArchiver {
    async fn extract(
        &self,
        name: &str,
        path: &Path,
        archives: &[PathBuf],
    ) -> Result<Vec<PathBuf>> {
        let mut extracted = Vec::new();

        for archive in archives {
            let archive_owned = archive.clone();
            // Subdirectory archives (e.g. CD1/, CD2/) extract in place
            let dest = archive.parent().unwrap_or(path).to_path_buf();

            let files = spawn_blocking(move || Self::extract_one(&archive_owned, &dest))
                .await
                .map_err(|e| Error::Extraction {
                    archive: archive.clone(),
                    reason: format!("extraction task panicked: {}", e),
                })??;

            debug!(name, ?archive, count = files.len(), "archive extracted");
            extracted.extend(files);
        }

        info!(
            name,
            archives = archives.len(),
            files = extracted.len(),
            "extraction complete"
        );
        Ok(extracted)
    }
}
