//! Stream configuration types

use crate::config::parse_timestamp;
use crate::decode::DEFAULT_RECORDS_PATH;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-stream settings supplied by the stream catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Stream name (e.g. "orders")
    pub name: String,
    /// Resource path under the admin API (e.g. "/orders")
    pub path: String,
    /// JSONPath locating records in a response
    #[serde(default = "default_records_path")]
    pub records_path: String,
    /// Field used for incremental replication
    #[serde(default)]
    pub replication_key: Option<String>,
    /// Static query parameters sent with every page
    #[serde(default)]
    pub additional_params: HashMap<String, String>,
}

fn default_records_path() -> String {
    DEFAULT_RECORDS_PATH.to_string()
}

impl StreamConfig {
    /// Create a stream reading a top-level array from `path`
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            records_path: default_records_path(),
            replication_key: None,
            additional_params: HashMap::new(),
        }
    }

    /// Set the records path
    #[must_use]
    pub fn with_records_path(mut self, path: impl Into<String>) -> Self {
        self.records_path = path.into();
        self
    }

    /// Set the replication key
    #[must_use]
    pub fn with_replication_key(mut self, key: impl Into<String>) -> Self {
        self.replication_key = Some(key.into());
        self
    }

    /// Add a static query parameter
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_params.insert(key.into(), value.into());
        self
    }
}

/// Incremental replication inputs for one stream run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicationContext {
    /// Bookmark recorded by a previous run
    pub starting_timestamp: Option<DateTime<Utc>>,
    /// Field the `[gt]` filter applies to
    pub replication_key: Option<String>,
}

impl ReplicationContext {
    /// Context with neither bookmark nor replication key
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for `stream` without a bookmark
    pub fn for_stream(stream: &StreamConfig) -> Self {
        Self {
            starting_timestamp: None,
            replication_key: stream.replication_key.clone(),
        }
    }

    /// Set the bookmark timestamp
    #[must_use]
    pub fn with_starting_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.starting_timestamp = Some(timestamp);
        self
    }

    /// Set the bookmark from a stored replication key value
    ///
    /// Values that do not parse as timestamps are ignored.
    #[must_use]
    pub fn with_bookmark(mut self, value: Option<&str>) -> Self {
        self.starting_timestamp = value.and_then(parse_timestamp);
        self
    }

    /// Set the replication key
    #[must_use]
    pub fn with_replication_key(mut self, key: impl Into<String>) -> Self {
        self.replication_key = Some(key.into());
        self
    }
}
