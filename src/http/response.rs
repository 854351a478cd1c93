//! Buffered API responses and error descriptions

use crate::error::{Error, Result};
use reqwest::{Response, StatusCode};
use serde_json::Value;

/// Whether a failed status is the caller's fault or the server's
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 400-499
    Client,
    /// Everything else
    Server,
}

impl ErrorClass {
    /// Classify an HTTP status code
    pub fn of(status: u16) -> Self {
        if (400..500).contains(&status) {
            Self::Client
        } else {
            Self::Server
        }
    }

    /// Label used in error descriptions
    pub fn label(self) -> &'static str {
        match self {
            Self::Client => "Client",
            Self::Server => "Server",
        }
    }
}

/// A fully read HTTP response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status
    pub status: StatusCode,
    /// Final request URL (including query string)
    pub url: String,
    /// Raw response body
    pub body: String,
}

impl ApiResponse {
    /// Create a response from its parts
    pub fn new(status: StatusCode, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            url: url.into(),
            body: body.into(),
        }
    }

    /// Read a reqwest response to completion
    pub async fn read(response: Response) -> Result<Self> {
        let status = response.status();
        let url = response.url().to_string();
        let body = response.text().await?;
        Ok(Self { status, url, body })
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Canonical reason phrase for the status
    pub fn reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    /// Parse the body as JSON; a body that is not JSON is malformed
    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(&self.body).map_err(|e| {
            Error::malformed(format!("Response from {} is not valid JSON: {e}", self.url))
        })
    }

    /// Diagnostic string for a failed response
    pub fn describe_error(&self) -> String {
        describe_response_error(self.status.as_u16(), self.reason(), &self.url, &self.body)
    }

    /// Convert a non-2xx response into an error
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::http_response(
                self.status.as_u16(),
                self.describe_error(),
            ))
        }
    }
}

/// Format a failed response as `"{status} {Client|Server} Error: ..."`
pub fn describe_response_error(status: u16, reason: &str, url: &str, body: &str) -> String {
    let class = ErrorClass::of(status);
    format!(
        "{status} {} Error: {reason} for url: {url} Response: {body}",
        class.label()
    )
}
