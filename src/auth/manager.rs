//! Credential manager
//!
//! Owns the bearer token used for email/password authentication. The token
//! is refreshed lazily: the first caller to observe an absent or expiring
//! token performs the login exchange, later callers reuse the cached value.

use super::types::CredentialState;
use crate::config::{ConfigStore, MedusaConfig};
use crate::error::{Error, Result};
use crate::http::{ApiResponse, HttpClient};
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Path of the login exchange, relative to the base URL
pub const AUTH_PATH: &str = "/auth/user/emailpass";

/// Acquires, caches and persists the admin bearer token
pub struct CredentialManager {
    /// Login email
    email: String,
    /// Login password
    password: String,
    /// Login endpoint URL
    auth_url: String,
    /// HTTP client for the login exchange
    http_client: Client,
    /// Cached token; the write lock serializes refreshes
    state: RwLock<CredentialState>,
    /// Where refreshed tokens are persisted
    store: Arc<dyn ConfigStore>,
    /// Number of login exchanges performed
    logins: AtomicUsize,
}

impl CredentialManager {
    /// Create a manager for `config`, seeding the cache from its persisted token
    ///
    /// The login exchange uses the default `HttpClientConfig` timeout.
    pub fn new(config: &MedusaConfig, store: Arc<dyn ConfigStore>) -> Result<Self> {
        Self::with_client(config, store, &HttpClient::new()?)
    }

    /// Create a manager whose login exchange shares `http`'s timeout
    pub fn with_client(
        config: &MedusaConfig,
        store: Arc<dyn ConfigStore>,
        http: &HttpClient,
    ) -> Result<Self> {
        let email = config
            .email
            .clone()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| Error::missing_field("email"))?;
        let password = config
            .password
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::missing_field("password"))?;

        Ok(Self {
            email,
            password,
            auth_url: format!("{}{AUTH_PATH}", config.root_url()),
            http_client: http.inner().clone(),
            state: RwLock::new(CredentialState::restored(
                config.access_token.clone(),
                config.expires_at(),
            )),
            store,
            logins: AtomicUsize::new(0),
        })
    }

    /// Create a manager from the store's current config
    pub async fn from_store(store: Arc<dyn ConfigStore>) -> Result<Self> {
        let config = store.snapshot().await;
        Self::new(&config, store)
    }

    /// Login endpoint URL
    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    /// Whether the cached token is present and outside the expiry buffer
    pub async fn is_token_valid(&self) -> bool {
        self.state.read().await.is_valid()
    }

    /// Snapshot of the cached credential state
    pub async fn credential_state(&self) -> CredentialState {
        self.state.read().await.clone()
    }

    /// Number of login exchanges performed so far
    pub fn login_count(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    /// Get a valid token, logging in if necessary
    pub async fn get_access_token(&self) -> Result<String> {
        {
            let cached = self.state.read().await;
            if cached.is_valid() {
                if let Some(token) = cached.token() {
                    return Ok(token.to_string());
                }
            }
        }

        let mut cached = self.state.write().await;

        // another caller may have refreshed while we waited for the lock
        if cached.is_valid() {
            if let Some(token) = cached.token() {
                debug!("Using token refreshed by a concurrent caller");
                return Ok(token.to_string());
            }
        }

        let token = self.login().await?;
        let issued_at = Utc::now();
        *cached = CredentialState::issued(token.clone(), issued_at);

        if let Some(expiry) = cached.expiry {
            self.store.save_credentials(&token, expiry).await?;
        }

        Ok(token)
    }

    /// Drop the cached token if it is still `rejected`
    ///
    /// Used after the API answers 401; a token already replaced by another
    /// caller is left alone.
    pub async fn invalidate(&self, rejected: &str) {
        let mut cached = self.state.write().await;
        if cached.token() == Some(rejected) {
            warn!("Access token rejected, will log in again");
            *cached = CredentialState::empty();
        }
    }

    async fn login(&self) -> Result<String> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        info!(url = %self.auth_url, "Requesting new access token");

        let body = LoginRequest {
            email: &self.email,
            password: &self.password,
        };

        let response = self
            .http_client
            .post(&self.auth_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::auth(format!("Failed during token generation: {e}")))?;
        let response = ApiResponse::read(response)
            .await
            .map_err(|e| Error::auth(format!("Failed during token generation: {e}")))?;

        if !response.is_success() {
            warn!(status = response.status.as_u16(), "Login exchange failed");
            return Err(Error::auth(format!(
                "Failed during token generation: {}",
                response.describe_error()
            )));
        }

        let parsed: LoginResponse = serde_json::from_str(&response.body)
            .map_err(|e| Error::auth(format!("Login response did not contain a token: {e}")))?;

        if parsed.token.is_empty() {
            return Err(Error::auth("Login response contained an empty token"));
        }

        Ok(parsed.token)
    }
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("email", &self.email)
            .field("auth_url", &self.auth_url)
            .field("logins", &self.login_count())
            .finish_non_exhaustive()
    }
}

/// Login exchange request body
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Login exchange response body
#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}
