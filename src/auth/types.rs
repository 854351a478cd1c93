//! Credential state types

use chrono::{DateTime, Duration, Utc};

/// Tokens closer than this to expiry are treated as expired
pub const TOKEN_EXPIRY_BUFFER_SECONDS: i64 = 120;

/// Lifetime assumed for a freshly issued token
pub const TOKEN_VALIDITY_MINUTES: i64 = 60;

/// Cached bearer token and its validity window
///
/// `expiry`, when present, is always `issued_at + TOKEN_VALIDITY_MINUTES`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialState {
    /// The bearer token
    pub bearer_token: Option<String>,
    /// When the token was issued
    pub issued_at: Option<DateTime<Utc>>,
    /// When the token stops being accepted
    pub expiry: Option<DateTime<Utc>>,
}

impl CredentialState {
    /// State with no cached token
    pub fn empty() -> Self {
        Self::default()
    }

    /// State for a token issued at `issued_at`
    pub fn issued(token: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            bearer_token: Some(token.into()),
            issued_at: Some(issued_at),
            expiry: Some(issued_at + validity_window()),
        }
    }

    /// Rebuild state from a persisted token and expiry
    pub fn restored(token: Option<String>, expiry: Option<DateTime<Utc>>) -> Self {
        Self {
            bearer_token: token,
            issued_at: expiry.map(|e| e - validity_window()),
            expiry,
        }
    }

    /// Whether the token can still be used at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let Some(token) = self.bearer_token.as_deref() else {
            return false;
        };
        if token.is_empty() {
            return false;
        }
        let Some(expiry) = self.expiry else {
            return false;
        };
        expiry - now >= Duration::seconds(TOKEN_EXPIRY_BUFFER_SECONDS)
    }

    /// Whether the token can still be used right now
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// The cached token, if any
    pub fn token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }
}

fn validity_window() -> Duration {
    Duration::minutes(TOKEN_VALIDITY_MINUTES)
}
