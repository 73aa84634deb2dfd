//! Queue API mocks, download directories, and a filesystem archiver

use arr_unpacker::{Application, Archiver, Config, Error, Result, StarrConfig};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_KEY: &str = "test-api-key";

/// One queue record as the v3 API returns it
pub fn queue_record(title: &str, status: &str, protocol: &str) -> Value {
    json!({
        "title": title,
        "status": status,
        "protocol": protocol,
        "size": 1_000_000.0,
        "sizeleft": 0.0,
        "episode": { "title": "Pilot" },
    })
}

/// Serve `records` as the queue until the server is reset
pub async fn mount_queue(server: &MockServer, records: Vec<Value>) {
    let body = json!({
        "page": 1,
        "pageSize": 1000,
        "totalRecords": records.len(),
        "records": records,
    });
    Mock::given(method("GET"))
        .and(path("/api/v3/queue"))
        .and(header("X-Api-Key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Swap the served queue for `records`
pub async fn replace_queue(server: &MockServer, records: Vec<Value>) {
    server.reset().await;
    mount_queue(server, records).await;
}

/// Config for one application polling `server`, with short loop intervals
pub fn fast_config(
    application: Application,
    server: &MockServer,
    download_root: &Path,
    delete_delay: Duration,
) -> Config {
    let starr = StarrConfig {
        api_key: API_KEY.to_string(),
        ..StarrConfig::new(application, server.uri(), download_root)
    };
    Config {
        applications: vec![starr],
        delete_delay,
        interval: Duration::from_millis(50),
        poll_interval: Duration::from_millis(50),
        shutdown_drain: Duration::from_secs(2),
    }
}

/// Create `root/name/` with the given archive volumes (empty files)
pub fn create_download(root: &Path, name: &str, volumes: &[&str]) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    for volume in volumes {
        std::fs::write(dir.join(volume), b"Rar!").unwrap();
    }
    dir
}

/// Archiver that writes one `.mkv` per archive instead of running unrar
#[derive(Default)]
pub struct MkvArchiver;

#[async_trait]
impl Archiver for MkvArchiver {
    async fn extract(
        &self,
        _name: &str,
        _path: &Path,
        archives: &[PathBuf],
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for archive in archives {
            let output = archive.with_extension("mkv");
            tokio::fs::write(&output, b"video")
                .await
                .map_err(|e| Error::Extraction {
                    archive: archive.clone(),
                    reason: e.to_string(),
                })?;
            written.push(output);
        }
        Ok(written)
    }
}
