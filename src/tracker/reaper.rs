//! Removal of finished records from history.

use crate::types::Event;
use chrono::{DateTime, Utc};
use tracing::info;

use super::Tracker;

impl Tracker {
    /// Reap `name` if it was deleted at least twice the delete delay ago.
    ///
    /// Returns `true` if this call removed the record.
    pub async fn finish(&self, name: &str, now: DateTime<Utc>) -> bool {
        let Some(record) = self.history.reap(name, self.reap_after(), now).await else {
            return false;
        };

        info!(app = %record.application, name, "finished, removing history");
        self.emit(Event::Finished {
            name: name.to_string(),
        });
        true
    }
}
