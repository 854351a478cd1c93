//! HTTP client module
//!
//! Provides the HTTP transport used for page requests.
//!
//! # Features
//!
//! - **Automatic Retries**: 429, 5xx, timeouts and connect errors are retried
//! - **Backoff Strategies**: Constant, linear, and exponential backoff
//! - **Error Descriptions**: failed responses carry a `Client Error` /
//!   `Server Error` diagnostic with status, reason, URL and body

mod client;
mod response;

pub use client::{BackoffType, HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use response::{describe_response_error, ApiResponse, ErrorClass};
