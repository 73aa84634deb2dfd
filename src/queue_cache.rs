//! Latest queue snapshot per application
//!
//! Each poll replaces an application's list wholesale. Readers get an
//! `Arc` to whichever complete list was current when they asked, so a
//! half-written snapshot is never observable.

use crate::types::{Application, QueueItem};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Most recent download queue of every polled application
#[derive(Debug, Default)]
pub struct QueueCache {
    queues: RwLock<HashMap<Application, Arc<Vec<QueueItem>>>>,
}

impl QueueCache {
    /// Empty cache; every application reads as an empty queue until polled
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a fresh snapshot for `application`
    pub async fn replace(&self, application: Application, items: Vec<QueueItem>) {
        let items = Arc::new(items);
        self.queues.write().await.insert(application, items);
    }

    /// Current snapshot for `application`
    pub async fn snapshot(&self, application: Application) -> Arc<Vec<QueueItem>> {
        self.queues
            .read()
            .await
            .get(&application)
            .cloned()
            .unwrap_or_default()
    }

    /// First live queue item titled `name`, if the application still lists one
    pub async fn find_item(&self, application: Application, name: &str) -> Option<QueueItem> {
        self.snapshot(application)
            .await
            .iter()
            .find(|item| item.title == name)
            .cloned()
    }
}
