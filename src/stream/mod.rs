//! Stream module
//!
//! The paginated fetcher for a single admin resource: request headers,
//! per-page query parameters (offset and incremental `[gt]` filter) and
//! next-cursor extraction.

mod fetcher;
mod types;

pub use fetcher::{
    compute_base_url, format_filter_timestamp, MedusaStream, Page, FILTER_TIMESTAMP_FORMAT,
};
pub use types::{ReplicationContext, StreamConfig};
