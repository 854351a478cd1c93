//! Authentication module
//!
//! Supports: static API key, email/password login with a cached bearer token
//!
//! The `CredentialManager` owns the bearer token, refreshes it lazily and
//! persists every refresh through a `ConfigStore`. `AuthMethod` picks between
//! the two modes and is shared by all streams of a run.

mod manager;
mod method;
mod types;

pub use manager::{CredentialManager, AUTH_PATH};
pub use method::{AuthMethod, API_KEY_HEADER};
pub use types::{CredentialState, TOKEN_EXPIRY_BUFFER_SECONDS, TOKEN_VALIDITY_MINUTES};
