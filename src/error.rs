//! Error types for tap-medusa
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for tap-medusa
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    /// A required config key is absent or empty
    #[error("Missing required config field: {field}")]
    MissingConfigField {
        /// Config key
        field: String,
    },

    /// A config key holds a value that cannot be used
    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue {
        /// Config key
        field: String,
        /// What is wrong with the value
        message: String,
    },

    /// JSON (de)serialization failure
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// `base_url` is not a URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    /// The login exchange failed or returned no token
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Failure description
        message: String,
    },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    /// Transport level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response that survived the retry budget
    #[error("{message}")]
    HttpResponse {
        /// HTTP status code
        status: u16,
        /// `"{status} {Client|Server} Error: ..."` description
        message: String,
    },

    /// The request did not complete within the client timeout
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout
        timeout_ms: u64,
    },

    /// Every attempt failed without a more specific error
    #[error("Max retries ({max_retries}) exceeded")]
    MaxRetriesExceeded {
        /// Configured retry budget
        max_retries: u32,
    },

    // ============================================================================
    // Response Processing Errors
    // ============================================================================
    /// Response body is not JSON
    #[error("Malformed response: {message}")]
    MalformedResponse {
        /// Parse failure description
        message: String,
    },

    /// Records path is not a valid JSONPath expression
    #[error("JSONPath error: {message}")]
    JsonPath {
        /// Parse failure description
        message: String,
    },

    /// Records path does not address records in the body
    #[error("Failed to extract records from path '{path}': {message}")]
    RecordExtraction {
        /// Records path
        path: String,
        /// What was found instead
        message: String,
    },

    // ============================================================================
    // Persistence Errors
    // ============================================================================
    /// Reading or writing the config file failed
    #[error("Config store error: {message}")]
    Store {
        /// Failure description
        message: String,
    },

    /// Other I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    /// Error with added context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create an HTTP response error from a status and its description
    pub fn http_response(status: u16, message: impl Into<String>) -> Self {
        Self::HttpResponse {
            status,
            message: message.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a JSONPath error
    pub fn json_path(message: impl Into<String>) -> Self {
        Self::JsonPath {
            message: message.into(),
        }
    }

    /// Create a record extraction error
    pub fn extraction(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecordExtraction {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a config store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpResponse { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::Timeout { .. } => true,
            Error::HttpResponse { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(
        status,
        429 | 500 | 502 | 503 | 504 | 520 | 521 | 522 | 523 | 524
    )
}

/// Result type alias for tap-medusa
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
