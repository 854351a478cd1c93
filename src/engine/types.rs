//! Engine types
//!
//! Message types and configuration for the sync engine.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A message emitted during sync
///
/// Serializes as one JSON line with an upper case `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Message {
    /// One extracted record
    Record {
        /// Stream name
        stream: String,
        /// The record as returned by the API
        record: Value,
        /// When the page holding the record was fetched
        time_extracted: DateTime<Utc>,
    },
    /// Bookmark state to persist between runs
    State {
        /// State document
        value: Value,
    },
    /// Log message
    Log {
        /// Log level
        level: LogLevel,
        /// Log message
        message: String,
    },
}

/// Log level for engine messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// General information
    Info,
    /// Warning
    Warn,
}

impl Message {
    /// Create a record message
    pub fn record(stream: impl Into<String>, record: Value, time_extracted: DateTime<Utc>) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted,
        }
    }

    /// Create a state message
    pub fn state(value: Value) -> Self {
        Self::State { value }
    }

    /// Create a log message
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            level,
            message: message.into(),
        }
    }

    /// Create an info log
    pub fn info(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Info, message)
    }

    /// Create a debug log
    pub fn debug(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Debug, message)
    }

    /// Create a warning log
    pub fn warn(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Warn, message)
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Check if this is a log message
    pub fn is_log(&self) -> bool {
        matches!(self, Self::Log { .. })
    }

    /// Render as a single JSON line
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// State document holding one stream's bookmark
pub fn bookmark_state(stream: &str, replication_key: &str, value: &str) -> Value {
    json!({
        "bookmarks": {
            stream: {
                "replication_key": replication_key,
                "replication_key_value": value,
            }
        }
    })
}

/// Configuration for sync operation
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Maximum records to sync per stream (0 = unlimited)
    pub max_records: usize,
    /// Maximum pages to fetch per stream (0 = unlimited)
    pub max_pages: usize,
}

impl SyncConfig {
    /// Create a new sync config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max records
    #[must_use]
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = max;
        self
    }

    /// Set max pages
    #[must_use]
    pub fn with_max_pages(mut self, max: usize) -> Self {
        self.max_pages = max;
        self
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Total records synced
    pub records_synced: usize,
    /// Total pages fetched
    pub pages_fetched: usize,
    /// Total streams synced
    pub streams_synced: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records
    pub fn add_records(&mut self, count: usize) {
        self.records_synced += count;
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add a stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }

    /// Fold another run's counters into these
    ///
    /// Durations take the maximum since streams run concurrently.
    pub fn merge(&mut self, other: &SyncStats) {
        self.records_synced += other.records_synced;
        self.pages_fetched += other.pages_fetched;
        self.streams_synced += other.streams_synced;
        self.duration_ms = self.duration_ms.max(other.duration_ms);
    }
}

/// Outcome of syncing one stream
#[derive(Debug, Clone)]
pub struct StreamSync {
    /// Stream name
    pub stream: String,
    /// Messages in emission order
    pub messages: Vec<Message>,
    /// Highest replication key value seen, or the incoming bookmark
    pub bookmark: Option<String>,
    /// Counters for this stream
    pub stats: SyncStats,
}

impl StreamSync {
    /// Records emitted for this stream
    pub fn records(&self) -> impl Iterator<Item = &Value> {
        self.messages.iter().filter_map(|m| match m {
            Message::Record { record, .. } => Some(record),
            _ => None,
        })
    }

    /// The final state message, if one was emitted
    pub fn state(&self) -> Option<&Value> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::State { value } => Some(value),
            _ => None,
        })
    }
}
