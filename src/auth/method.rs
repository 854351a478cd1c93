//! Request authentication selection

use super::manager::CredentialManager;
use crate::config::{AuthMode, ConfigStore, MedusaConfig};
use crate::error::Result;
use crate::http::HttpClient;
use std::sync::Arc;

/// Header carrying a static admin API key
pub const API_KEY_HEADER: &str = "x-medusa-access-token";

/// How page requests are authenticated
///
/// Cloning shares the underlying credential manager, so every stream built
/// from one `AuthMethod` sees the same token.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Static API key, no login exchange
    ApiKey(String),
    /// Bearer token from the shared credential manager
    Credentials(Arc<CredentialManager>),
}

impl AuthMethod {
    /// Pick the auth method for `config`; an API key takes priority
    pub fn from_config(config: &MedusaConfig, store: Arc<dyn ConfigStore>) -> Result<Self> {
        Self::from_config_with_client(config, store, &HttpClient::new()?)
    }

    /// Same as `from_config`, with the login exchange bound by `http`'s timeout
    pub fn from_config_with_client(
        config: &MedusaConfig,
        store: Arc<dyn ConfigStore>,
        http: &HttpClient,
    ) -> Result<Self> {
        match config.auth_mode()? {
            AuthMode::ApiKey(key) => Ok(Self::ApiKey(key)),
            AuthMode::EmailPassword { .. } => Ok(Self::Credentials(Arc::new(
                CredentialManager::with_client(config, store, http)?,
            ))),
        }
    }

    /// Header name and value authenticating one request
    pub async fn header(&self) -> Result<(&'static str, String)> {
        match self {
            Self::ApiKey(key) => Ok((API_KEY_HEADER, key.clone())),
            Self::Credentials(manager) => {
                let token = manager.get_access_token().await?;
                Ok(("Authorization", format!("Bearer {token}")))
            }
        }
    }

    /// The shared credential manager, when bearer auth is in use
    pub fn credential_manager(&self) -> Option<&Arc<CredentialManager>> {
        match self {
            Self::ApiKey(_) => None,
            Self::Credentials(manager) => Some(manager),
        }
    }
}
