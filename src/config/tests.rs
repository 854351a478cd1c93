//! Tests for the config module

use super::*;
use crate::error::Error;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use tempfile::tempdir;
use test_case::test_case;

// ============================================================================
// MedusaConfig Tests
// ============================================================================

#[test]
fn test_config_from_json() {
    let config = MedusaConfig::from_json(
        r#"{
            "base_url": "https://shop.example.com",
            "email": "admin@example.com",
            "password": "secret",
            "user_agent": "tap-medusa/test",
            "start_date": "2024-01-01T00:00:00Z"
        }"#,
    )
    .unwrap();

    assert_eq!(config.base_url, "https://shop.example.com");
    assert_eq!(config.email.as_deref(), Some("admin@example.com"));
    assert_eq!(config.user_agent.as_deref(), Some("tap-medusa/test"));
    assert!(config.api_key.is_none());
    assert!(config.extra.is_empty());
}

#[test]
fn test_config_preserves_unknown_keys() {
    let config = MedusaConfig::from_json(
        r#"{"base_url": "https://shop.example.com", "api_key": "k", "region": "eu"}"#,
    )
    .unwrap();

    assert_eq!(config.extra.get("region"), Some(&json!("eu")));

    let written = serde_json::to_value(&config).unwrap();
    assert_eq!(written["region"], "eu");
    assert!(written.get("access_token").is_none());
}

#[test]
fn test_auth_mode_api_key_wins() {
    let config = MedusaConfig::new("https://shop.example.com")
        .with_credentials("a@b.c", "pw")
        .with_api_key("sk_123");

    assert_eq!(config.auth_mode().unwrap(), AuthMode::ApiKey("sk_123".into()));
}

#[test]
fn test_auth_mode_email_password() {
    let config = MedusaConfig::new("https://shop.example.com").with_credentials("a@b.c", "pw");

    assert_eq!(
        config.auth_mode().unwrap(),
        AuthMode::EmailPassword {
            email: "a@b.c".into(),
            password: "pw".into(),
        }
    );
}

#[test]
fn test_auth_mode_missing_password() {
    let mut config = MedusaConfig::new("https://shop.example.com");
    config.email = Some("a@b.c".into());

    let err = config.auth_mode().unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { ref field } if field == "password"));
}

#[test]
fn test_auth_mode_empty_api_key_falls_back() {
    let config = MedusaConfig::new("https://shop.example.com")
        .with_api_key("")
        .with_credentials("a@b.c", "pw");

    assert!(matches!(
        config.auth_mode().unwrap(),
        AuthMode::EmailPassword { .. }
    ));
}

#[test]
fn test_validate() {
    let config = MedusaConfig::new("https://shop.example.com")
        .with_api_key("k")
        .with_start_date("2024-01-01");
    assert!(config.validate().is_ok());

    let missing = MedusaConfig::new("").with_api_key("k");
    assert!(matches!(
        missing.validate().unwrap_err(),
        Error::MissingConfigField { .. }
    ));

    let bad_url = MedusaConfig::new("not a url").with_api_key("k");
    assert!(matches!(bad_url.validate().unwrap_err(), Error::InvalidUrl(_)));

    let bad_date = MedusaConfig::new("https://shop.example.com")
        .with_api_key("k")
        .with_start_date("last tuesday");
    assert!(matches!(
        bad_date.validate().unwrap_err(),
        Error::InvalidConfigValue { .. }
    ));
}

#[test_case("2024-01-01T00:00:00Z", 2024, 1, 1, 0, 0, 0 ; "rfc3339 utc")]
#[test_case("2024-01-01T02:00:00+02:00", 2024, 1, 1, 0, 0, 0 ; "rfc3339 offset")]
#[test_case("2024-03-05T10:11:12", 2024, 3, 5, 10, 11, 12 ; "naive datetime")]
#[test_case("2024-03-05T10:11:12.250", 2024, 3, 5, 10, 11, 12 ; "naive fractional")]
#[test_case("2024-03-05", 2024, 3, 5, 0, 0, 0 ; "date only")]
fn test_parse_timestamp(input: &str, y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) {
    let parsed = parse_timestamp(input).unwrap();
    let expected = Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap();
    assert_eq!(parsed.timestamp(), expected.timestamp());
}

#[test]
fn test_parse_timestamp_invalid() {
    assert!(parse_timestamp("").is_none());
    assert!(parse_timestamp("yesterday").is_none());
    assert!(parse_timestamp("2024-13-45").is_none());
}

#[test]
fn test_expires_at_number_and_string() {
    let mut config = MedusaConfig::new("https://shop.example.com");
    config.expires_in = Some(json!(1_704_067_200));
    assert_eq!(
        config.expires_at(),
        Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    );

    config.expires_in = Some(json!("1704067200"));
    assert_eq!(
        config.expires_at(),
        Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    );
}

#[test]
fn test_expires_at_unparseable_is_absent() {
    let mut config = MedusaConfig::new("https://shop.example.com");
    config.expires_in = Some(json!("soon"));
    assert!(config.expires_at().is_none());

    config.expires_in = Some(json!({"at": 1}));
    assert!(config.expires_at().is_none());

    config.expires_in = Some(json!(0));
    assert!(config.expires_at().is_none());

    config.expires_in = None;
    assert!(config.expires_at().is_none());
}

#[test]
fn test_root_url_strips_trailing_slashes() {
    let config = MedusaConfig::new("https://shop.example.com//");
    assert_eq!(config.root_url(), "https://shop.example.com");
}

// ============================================================================
// Store Tests
// ============================================================================

#[tokio::test]
async fn test_memory_store_save_credentials() {
    let store = MemoryConfigStore::new(MedusaConfig::new("https://shop.example.com"));
    let expires = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

    store.save_credentials("tok", expires).await.unwrap();

    let config = store.snapshot().await;
    assert_eq!(config.access_token.as_deref(), Some("tok"));
    assert_eq!(config.expires_at(), Some(expires));
    assert_eq!(store.save_count(), 1);
}

#[tokio::test]
async fn test_file_store_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"base_url": "https://shop.example.com", "email": "a@b.c", "password": "pw", "custom": 7}"#,
    )
    .unwrap();

    let store = FileConfigStore::open(&path).unwrap();
    let expires = Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap();
    store.save_credentials("fresh", expires).await.unwrap();

    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk["access_token"], "fresh");
    assert_eq!(on_disk["expires_in"], expires.timestamp());
    assert_eq!(on_disk["email"], "a@b.c");
    assert_eq!(on_disk["custom"], 7);
    assert!(!path.with_extension("tmp").exists());

    let reopened = FileConfigStore::open(&path).unwrap();
    assert_eq!(reopened.snapshot().await.access_token.as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_file_store_overwrites_previous_token() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    let store = FileConfigStore::new(&path, MedusaConfig::new("https://shop.example.com"));

    let first = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2030, 1, 1, 1, 0, 0).unwrap();
    store.save_credentials("one", first).await.unwrap();
    store.save_credentials("two", second).await.unwrap();

    let on_disk = MedusaConfig::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk.access_token.as_deref(), Some("two"));
    assert_eq!(on_disk.expires_at(), Some(second));
}

#[tokio::test]
async fn test_file_store_concurrent_saves_are_consistent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    let store = Arc::new(FileConfigStore::new(
        &path,
        MedusaConfig::new("https://shop.example.com"),
    ));

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let expires = Utc.with_ymd_and_hms(2030, 1, 1, 0, i, 0).unwrap();
            store
                .save_credentials(&format!("token-{i}"), expires)
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let in_memory = store.snapshot().await;
    let on_disk = MedusaConfig::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(in_memory, on_disk);
}

#[test]
fn test_file_store_open_missing_file() {
    let dir = tempdir().unwrap();
    let err = FileConfigStore::open(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, Error::Store { .. }));
}
