use crate::error::Error;
use crate::extraction::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, b"not really a rar").unwrap();
}

// ---------------------------------------------------------------------------
// Volume naming
// ---------------------------------------------------------------------------

#[test]
fn test_plain_rar_is_first_volume() {
    assert!(RarLocator::is_first_volume("Show.S01E01.rar"));
    assert!(RarLocator::is_first_volume("SHOW.S01E01.RAR"));
}

#[test]
fn test_only_part_one_is_first_volume() {
    assert!(RarLocator::is_first_volume("movie.part1.rar"));
    assert!(RarLocator::is_first_volume("movie.part01.rar"));
    assert!(RarLocator::is_first_volume("movie.part001.rar"));
    assert!(!RarLocator::is_first_volume("movie.part02.rar"));
    assert!(!RarLocator::is_first_volume("movie.part10.rar"));
    assert!(!RarLocator::is_first_volume("movie.part11.rar"));
}

#[test]
fn test_non_rar_files_are_ignored() {
    assert!(!RarLocator::is_first_volume("movie.r00"));
    assert!(!RarLocator::is_first_volume("movie.mkv"));
    assert!(!RarLocator::is_first_volume("movie.sfv"));
    assert!(!RarLocator::is_first_volume("rar"));
}

// ---------------------------------------------------------------------------
// Locator
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_locator_finds_nested_archives_in_order() {
    let dir = TempDir::new().unwrap();
    touch(&dir.path().join("CD2/movie.cd2.rar"));
    touch(&dir.path().join("CD1/movie.cd1.rar"));
    touch(&dir.path().join("movie.part01.rar"));
    touch(&dir.path().join("movie.part02.rar"));
    touch(&dir.path().join("movie.r00"));
    touch(&dir.path().join("movie.nfo"));

    let found = RarLocator.find(dir.path()).await;

    let expected: Vec<PathBuf> = vec![
        dir.path().join("CD1/movie.cd1.rar"),
        dir.path().join("CD2/movie.cd2.rar"),
        dir.path().join("movie.part01.rar"),
    ];
    assert_eq!(found, expected);
}

#[tokio::test]
async fn test_locator_missing_directory_is_empty() {
    let dir = TempDir::new().unwrap();
    let found = RarLocator.find(&dir.path().join("not-downloaded-yet")).await;
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_locator_directory_without_archives() {
    let dir = TempDir::new().unwrap();
    touch(&dir.path().join("episode.mkv"));
    assert!(RarLocator.find(dir.path()).await.is_empty());
}

// ---------------------------------------------------------------------------
// Archiver
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_archiver_reports_corrupt_archive() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("broken.rar");
    touch(&archive);

    let result = RarArchiver
        .extract("broken", dir.path(), std::slice::from_ref(&archive))
        .await;

    match result {
        Err(Error::Extraction { archive: failed, .. }) => assert_eq!(failed, archive),
        other => panic!("expected extraction error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_archiver_with_no_archives_extracts_nothing() {
    let dir = TempDir::new().unwrap();
    let files = RarArchiver.extract("empty", dir.path(), &[]).await.unwrap();
    assert!(files.is_empty());
}
