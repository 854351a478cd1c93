//! Execution engine module
//!
//! Main read loop and stream orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Drives paginated fetches and tracks the replication bookmark
//! - `SyncConfig` - Limits for a sync run
//! - Message types for output (Record, State, Log)

mod types;

pub use types::{bookmark_state, LogLevel, Message, StreamSync, SyncConfig, SyncStats};

use crate::config::parse_timestamp;
use crate::error::Result;
use crate::pagination::PaginationState;
use crate::stream::{MedusaStream, ReplicationContext};
use chrono::Utc;
use futures::future::try_join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, warn};

/// Sync engine for orchestrating data extraction
#[derive(Debug, Clone, Default)]
pub struct SyncEngine {
    /// Sync configuration
    config: SyncConfig,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the sync configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Sync one stream starting after `bookmark`
    ///
    /// Pages are fetched until one comes back empty or a limit is reached.
    /// A final `STATE` message carries the highest replication key value seen.
    /// Records are not ordered by the replication key, so a run stopped by a
    /// limit keeps the incoming bookmark instead.
    pub async fn sync_stream(
        &self,
        stream: &MedusaStream,
        bookmark: Option<&str>,
    ) -> Result<StreamSync> {
        let start = Instant::now();
        let name = stream.name().to_string();
        let mut stats = SyncStats::new();
        let mut messages = vec![Message::info(format!("Starting sync for stream: {name}"))];
        info!(stream = %name, bookmark = ?bookmark, "Starting sync");

        let context = ReplicationContext::for_stream(stream.config()).with_bookmark(bookmark);
        let replication_key = context.replication_key.clone();
        let mut max_value = bookmark.map(str::to_string);
        let mut pagination = PaginationState::new();
        let mut emitted = 0usize;
        let mut truncated = false;

        'pages: loop {
            if self.config.max_pages > 0 && pagination.pages as usize >= self.config.max_pages {
                warn!(stream = %name, pages = pagination.pages, "Page limit reached");
                messages.push(Message::warn(format!(
                    "Stopped {name} after {} pages",
                    pagination.pages
                )));
                truncated = true;
                break;
            }

            let page = stream.fetch_page(&context, pagination.cursor).await?;
            let time_extracted = Utc::now();
            stats.add_page();

            messages.push(Message::debug(format!(
                "Page {}: fetched {} records",
                pagination.pages + 1,
                page.records.len()
            )));

            for record in page.records {
                if let Some(key) = &replication_key {
                    if let Some(value) = replication_value(&record, key) {
                        if max_value.as_deref().map_or(true, |cur| is_newer(&value, cur)) {
                            max_value = Some(value);
                        }
                    }
                }
                messages.push(Message::record(&name, record, time_extracted));
                emitted += 1;

                if self.config.max_records > 0 && emitted >= self.config.max_records {
                    truncated = true;
                    break 'pages;
                }
            }

            if pagination.advance(page.next_token).is_done() {
                break;
            }
        }

        stats.add_records(emitted);

        if truncated {
            warn!(stream = %name, "Run stopped early, bookmark not advanced");
            max_value = bookmark.map(str::to_string);
        }

        if let (Some(key), Some(value)) = (&replication_key, &max_value) {
            messages.push(Message::state(bookmark_state(&name, key, value)));
        }

        stats.add_stream();
        #[allow(clippy::cast_possible_truncation)]
        stats.set_duration(start.elapsed().as_millis() as u64);

        info!(
            stream = %name,
            records = stats.records_synced,
            pages = stats.pages_fetched,
            "Completed sync"
        );
        messages.push(Message::info(format!(
            "Completed sync for {name}: {} records in {} pages",
            stats.records_synced, stats.pages_fetched
        )));

        Ok(StreamSync {
            stream: name,
            messages,
            bookmark: max_value,
            stats,
        })
    }

    /// Sync several streams concurrently
    ///
    /// Bookmarks are looked up by stream name. The first failure aborts the run.
    pub async fn sync_all(
        &self,
        streams: &[MedusaStream],
        bookmarks: &HashMap<String, String>,
    ) -> Result<Vec<StreamSync>> {
        let runs = streams.iter().map(|stream| {
            let bookmark = bookmarks.get(stream.name()).map(String::as_str);
            self.sync_stream(stream, bookmark)
        });
        try_join_all(runs).await
    }
}

/// Replication key value of a record, following dotted paths
fn replication_value(record: &Value, key: &str) -> Option<String> {
    let mut current = record;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    match current {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Compare as timestamps when both parse, else as strings
fn is_newer(candidate: &str, current: &str) -> bool {
    match (parse_timestamp(candidate), parse_timestamp(current)) {
        (Some(a), Some(b)) => a > b,
        _ => candidate > current,
    }
}

#[cfg(test)]
mod tests;
