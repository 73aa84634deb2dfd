//! Sonarr/Radarr queue access
//!
//! [`QueueSource`] is the seam the poller fetches through. [`StarrClient`]
//! implements it against the v3 `/api/v3/queue` endpoint both applications
//! share.

use crate::config::StarrConfig;
use crate::error::{Error, Result};
use crate::types::{Application, QueueItem};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Records requested per queue page
const QUEUE_PAGE_SIZE: u32 = 1000;

/// Source of full queue snapshots
///
/// A successful fetch returns the complete queue. On error the caller keeps
/// whatever snapshot it already had.
#[async_trait]
pub trait QueueSource: Send + Sync {
    /// Fetch the complete download queue of `application`
    async fn fetch(&self, application: Application) -> Result<Vec<QueueItem>>;
}

/// One page of the v3 queue response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueuePage {
    #[serde(default)]
    total_records: usize,
    #[serde(default)]
    records: Vec<QueueItem>,
}

#[derive(Debug, Clone)]
struct Endpoint {
    url: String,
    api_key: String,
    timeout: Duration,
}

/// HTTP client for the Sonarr and Radarr queue APIs
#[derive(Debug, Clone)]
pub struct StarrClient {
    client: reqwest::Client,
    endpoints: HashMap<Application, Endpoint>,
}

impl StarrClient {
    /// Client for every configured application
    pub fn new(configs: &[StarrConfig]) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("arr-unpacker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let endpoints = configs
            .iter()
            .map(|c| {
                (
                    c.application,
                    Endpoint {
                        url: c.url.trim_end_matches('/').to_string(),
                        api_key: c.api_key.clone(),
                        timeout: c.timeout,
                    },
                )
            })
            .collect();

        Ok(Self { client, endpoints })
    }
}

impl StarrClient {
    /// Fetch one page of `application`'s queue
    async fn fetch_page(
        &self,
        application: Application,
        endpoint: &Endpoint,
        page: u32,
    ) -> Result<QueuePage> {
        let mut request = self
            .client
            .get(format!("{}/api/v3/queue", endpoint.url))
            .query(&[("page", page), ("pageSize", QUEUE_PAGE_SIZE)])
            .timeout(endpoint.timeout);
        if application == Application::Sonarr {
            request = request.query(&[("includeEpisode", "true")]);
        }
        if !endpoint.api_key.is_empty() {
            request = request.header("X-Api-Key", &endpoint.api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::QueueFetch {
                application,
                reason: format!("HTTP {} on page {}", status, page),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl QueueSource for StarrClient {
    async fn fetch(&self, application: Application) -> Result<Vec<QueueItem>> {
        let endpoint = self
            .endpoints
            .get(&application)
            .ok_or_else(|| Error::QueueFetch {
                application,
                reason: "application is not configured".into(),
            })?;

        // Items missing from the snapshot read as imported: all pages or an error
        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let QueuePage {
                total_records,
                records: batch,
            } = self.fetch_page(application, endpoint, page).await?;

            let fetched = batch.len();
            records.extend(batch);
            if records.len() >= total_records {
                break;
            }
            if fetched == 0 {
                return Err(Error::QueueFetch {
                    application,
                    reason: format!(
                        "page {} was empty with {} of {} records fetched",
                        page,
                        records.len(),
                        total_records
                    ),
                });
            }

            debug!(
                app = %application,
                page,
                fetched = records.len(),
                total = total_records,
                "queue spans several pages"
            );
            page += 1;
        }

        Ok(records)
    }
}
