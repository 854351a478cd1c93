//! Configuration module
//!
//! Typed tap configuration plus the store the credential manager persists
//! refreshed tokens through.

mod store;
mod types;

pub use store::{ConfigStore, FileConfigStore, MemoryConfigStore};
pub use types::{parse_timestamp, AuthMode, MedusaConfig};

#[cfg(test)]
mod tests;
