// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # tap-medusa
//!
//! Extraction core for the Medusa e-commerce admin REST API.
//!
//! ## Features
//!
//! - **Two Auth Modes**: static API key, or email/password login with a
//!   cached bearer token that is refreshed lazily and persisted back to the
//!   configuration file
//! - **Offset Pagination**: the cursor is the cumulative record count; an
//!   empty page ends the stream
//! - **Incremental Sync**: `{key}[gt]` date filters from a bookmark or the
//!   configured start date, with the new bookmark emitted as `STATE`
//! - **Concurrent Streams**: streams share one credential manager and only
//!   one login runs at a time
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tap_medusa::auth::AuthMethod;
//! use tap_medusa::config::{ConfigStore, FileConfigStore};
//! use tap_medusa::engine::SyncEngine;
//! use tap_medusa::http::HttpClient;
//! use tap_medusa::stream::{MedusaStream, StreamConfig};
//!
//! #[tokio::main]
//! async fn main() -> tap_medusa::Result<()> {
//!     let store = Arc::new(FileConfigStore::open("config.json")?);
//!     let config = store.snapshot().await;
//!     config.validate()?;
//!
//!     let http = HttpClient::new()?;
//!     let auth = AuthMethod::from_config_with_client(&config, store, &http)?;
//!     let orders = StreamConfig::new("orders", "/orders").with_replication_key("updated_at");
//!     let stream = MedusaStream::new(orders, &config, auth, http);
//!
//!     let sync = SyncEngine::new().sync_stream(&stream, None).await?;
//!     for message in &sync.messages {
//!         println!("{}", message.to_json_line()?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                        SyncEngine                          │
//! │   sync_stream(stream, bookmark)    sync_all(streams)       │
//! └────────────────────────────────────────────────────────────┘
//!                               │
//! ┌───────────┬─────────────┬───┴──────────┬───────────────────┐
//! │  stream   │    auth     │  pagination  │      decode       │
//! ├───────────┼─────────────┼──────────────┼───────────────────┤
//! │ headers   │ API key     │ offset       │ $[*]              │
//! │ params    │ bearer      │ FETCHING     │ $.key[*]          │
//! │ errors    │ single-     │  → DONE      │ jsonpath          │
//! │           │ flight      │              │                   │
//! └───────────┴─────────────┴──────────────┴───────────────────┘
//!        │             │
//!      http        config (ConfigStore)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Tap configuration and the store it is persisted through
pub mod config;

/// API key and bearer token authentication
pub mod auth;

/// HTTP client with retry and backoff
pub mod http;

/// Offset pagination
pub mod pagination;

/// Record extraction from response bodies
pub mod decode;

/// Per-stream request building and page fetching
pub mod stream;

/// Sync loop and output messages
pub mod engine;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
