//! Tests for engine module

use super::*;
use crate::auth::AuthMethod;
use crate::config::{MedusaConfig, MemoryConfigStore};
use crate::error::Error;
use crate::http::{BackoffType, HttpClient, HttpClientConfig};
use crate::stream::{ReplicationContext, StreamConfig};
use chrono::TimeZone;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_http() -> HttpClient {
    HttpClient::with_config(
        HttpClientConfig::builder()
            .max_retries(1)
            .backoff(
                BackoffType::Constant,
                Duration::from_millis(5),
                Duration::from_millis(5),
            )
            .build(),
    )
    .unwrap()
}

fn medusa_stream(base_url: &str, config: StreamConfig) -> MedusaStream {
    let tap_config = MedusaConfig::new(base_url).with_api_key("sk_test");
    let store = Arc::new(MemoryConfigStore::new(tap_config.clone()));
    let auth = AuthMethod::from_config(&tap_config, store).unwrap();
    MedusaStream::new(config, &tap_config, auth, test_http())
}

fn orders() -> StreamConfig {
    StreamConfig::new("orders", "/orders").with_replication_key("updated_at")
}

/// Mount three pages of orders: two records, two records, then empty
async fn mount_order_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/admin/orders"))
        .and(query_param_is_missing("offset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "order_1", "updated_at": "2024-03-01T10:00:00.000Z"},
            {"id": "order_2", "updated_at": "2024-03-04T09:00:00.000Z"}
        ])))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin/orders"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "order_3", "updated_at": "2024-03-02T12:00:00.000Z"},
            {"id": "order_4", "updated_at": "2024-03-03T08:30:00.000Z"}
        ])))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin/orders"))
        .and(query_param("offset", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(server)
        .await;
}

// ============================================================================
// Message Tests
// ============================================================================

#[test]
fn test_message_kinds() {
    let now = Utc::now();
    let record = Message::record("orders", json!({"id": 1}), now);
    assert!(record.is_record());
    assert!(!record.is_state());

    let state = Message::state(json!({"bookmarks": {}}));
    assert!(state.is_state());
    assert!(!state.is_log());

    for log in [Message::info("i"), Message::debug("d"), Message::warn("w")] {
        assert!(log.is_log());
        assert!(!log.is_record());
    }
}

#[test]
fn test_message_json_lines() {
    let extracted = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let record = Message::record("orders", json!({"id": "order_1"}), extracted);
    let line: Value = serde_json::from_str(&record.to_json_line().unwrap()).unwrap();
    assert_eq!(
        line,
        json!({
            "type": "RECORD",
            "stream": "orders",
            "record": {"id": "order_1"},
            "time_extracted": "2024-03-01T12:00:00Z"
        })
    );

    let log: Value =
        serde_json::from_str(&Message::warn("slow").to_json_line().unwrap()).unwrap();
    assert_eq!(log, json!({"type": "LOG", "level": "WARN", "message": "slow"}));

    let state = Message::state(bookmark_state("orders", "updated_at", "2024-03-01"));
    let parsed: Message = serde_json::from_str(&state.to_json_line().unwrap()).unwrap();
    assert_eq!(parsed, state);
}

#[test]
fn test_bookmark_state_shape() {
    assert_eq!(
        bookmark_state("customers", "created_at", "2024-01-01T00:00:00Z"),
        json!({
            "bookmarks": {
                "customers": {
                    "replication_key": "created_at",
                    "replication_key_value": "2024-01-01T00:00:00Z"
                }
            }
        })
    );
}

// ============================================================================
// SyncConfig / SyncStats Tests
// ============================================================================

#[test]
fn test_sync_config_builder() {
    let config = SyncConfig::default();
    assert_eq!(config.max_records, 0);
    assert_eq!(config.max_pages, 0);

    let config = SyncConfig::new().with_max_records(100).with_max_pages(5);
    assert_eq!(config.max_records, 100);
    assert_eq!(config.max_pages, 5);
}

#[test]
fn test_sync_stats_merge() {
    let mut total = SyncStats::new();
    let mut a = SyncStats::new();
    a.add_records(10);
    a.add_page();
    a.add_stream();
    a.set_duration(200);

    let mut b = SyncStats::new();
    b.add_records(5);
    b.add_page();
    b.add_page();
    b.add_stream();
    b.set_duration(150);

    total.merge(&a);
    total.merge(&b);
    assert_eq!(
        total,
        SyncStats {
            records_synced: 15,
            pages_fetched: 3,
            streams_synced: 2,
            duration_ms: 200,
        }
    );
}

#[test]
fn test_replication_value_lookup() {
    let record = json!({"updated_at": "2024-01-01", "meta": {"version": 7}, "flag": true});
    assert_eq!(
        replication_value(&record, "updated_at").as_deref(),
        Some("2024-01-01")
    );
    assert_eq!(replication_value(&record, "meta.version").as_deref(), Some("7"));
    assert_eq!(replication_value(&record, "flag"), None);
    assert_eq!(replication_value(&record, "missing"), None);
}

#[test]
fn test_is_newer_compares_timestamps() {
    assert!(is_newer("2024-03-04T09:00:00.000Z", "2024-03-01T10:00:00Z"));
    assert!(!is_newer("2024-03-01", "2024-03-01T10:00:00Z"));
    assert!(is_newer("b", "a"));
}

// ============================================================================
// SyncEngine Tests
// ============================================================================

#[tokio::test]
async fn test_sync_stream_paginates_until_empty_page() {
    let server = MockServer::start().await;
    mount_order_pages(&server).await;

    let stream = medusa_stream(&server.uri(), orders());
    let sync = SyncEngine::new().sync_stream(&stream, None).await.unwrap();

    let ids: Vec<_> = sync.records().map(|r| r["id"].clone()).collect();
    assert_eq!(
        ids,
        vec![json!("order_1"), json!("order_2"), json!("order_3"), json!("order_4")]
    );
    assert_eq!(sync.stats.records_synced, 4);
    assert_eq!(sync.stats.pages_fetched, 3);
    assert_eq!(sync.stats.streams_synced, 1);
    assert_eq!(sync.stream, "orders");
}

#[tokio::test]
async fn test_sync_stream_emits_max_bookmark() {
    let server = MockServer::start().await;
    mount_order_pages(&server).await;

    let stream = medusa_stream(&server.uri(), orders());
    let sync = SyncEngine::new().sync_stream(&stream, None).await.unwrap();

    assert_eq!(sync.bookmark.as_deref(), Some("2024-03-04T09:00:00.000Z"));
    assert_eq!(
        sync.state(),
        Some(&bookmark_state(
            "orders",
            "updated_at",
            "2024-03-04T09:00:00.000Z"
        ))
    );

    let last_data = sync
        .messages
        .iter()
        .rposition(|m| m.is_record() || m.is_state())
        .unwrap();
    assert!(sync.messages[last_data].is_state());
}

#[tokio::test]
async fn test_sync_stream_applies_bookmark_filter() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/orders"))
        .and(query_param("updated_at[gt]", "2024-05-01T00:00:01Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let stream = medusa_stream(&server.uri(), orders());
    let sync = SyncEngine::new()
        .sync_stream(&stream, Some("2024-05-01T00:00:00Z"))
        .await
        .unwrap();

    assert_eq!(sync.records().count(), 0);
    assert_eq!(sync.bookmark.as_deref(), Some("2024-05-01T00:00:00Z"));
    assert!(sync.state().is_some());
}

#[tokio::test]
async fn test_sync_stream_without_replication_key_has_no_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/regions"))
        .and(query_param_is_missing("offset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "regions": [{"id": "reg_1"}],
            "count": 1
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin/regions"))
        .and(query_param("offset", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "regions": [],
            "count": 1
        })))
        .mount(&server)
        .await;

    let stream = medusa_stream(
        &server.uri(),
        StreamConfig::new("regions", "/regions").with_records_path("$.regions[*]"),
    );
    let sync = SyncEngine::new().sync_stream(&stream, None).await.unwrap();

    assert_eq!(sync.records().count(), 1);
    assert!(sync.state().is_none());
    assert!(sync.bookmark.is_none());
}

#[tokio::test]
async fn test_sync_stream_max_records() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "updated_at": "2024-01-01T00:00:00Z"},
            {"id": 2, "updated_at": "2024-01-02T00:00:00Z"},
            {"id": 3, "updated_at": "2024-01-03T00:00:00Z"},
            {"id": 4, "updated_at": "2024-01-04T00:00:00Z"},
            {"id": 5, "updated_at": "2024-01-05T00:00:00Z"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let stream = medusa_stream(&server.uri(), orders());
    let engine = SyncEngine::new().with_config(SyncConfig::new().with_max_records(3));
    let sync = engine.sync_stream(&stream, None).await.unwrap();

    assert_eq!(sync.stats.records_synced, 3);
    assert_eq!(sync.records().count(), 3);
    assert_eq!(sync.bookmark, None);
    assert!(sync.state().is_none());
}

#[tokio::test]
async fn test_truncated_unsorted_run_keeps_incoming_bookmark() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/orders"))
        .and(query_param("updated_at[gt]", "2023-12-31T00:00:01Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "updated_at": "2024-01-05T00:00:00Z"},
            {"id": 2, "updated_at": "2024-01-01T00:00:00Z"},
            {"id": 3, "updated_at": "2024-01-03T00:00:00Z"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let stream = medusa_stream(&server.uri(), orders());
    let engine = SyncEngine::new().with_config(SyncConfig::new().with_max_records(1));
    let sync = engine
        .sync_stream(&stream, Some("2023-12-31T00:00:00Z"))
        .await
        .unwrap();

    let ids: Vec<_> = sync.records().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!(1)]);

    // ids 2 and 3 must still pass the next run's filter
    assert_eq!(sync.bookmark.as_deref(), Some("2023-12-31T00:00:00Z"));
    assert_eq!(
        sync.state(),
        Some(&bookmark_state("orders", "updated_at", "2023-12-31T00:00:00Z"))
    );

    let next = ReplicationContext::for_stream(stream.config())
        .with_bookmark(sync.bookmark.as_deref());
    assert_eq!(
        stream.build_url_params(&next, None).get("updated_at[gt]"),
        Some(&"2023-12-31T00:00:01Z".to_string())
    );
}

#[tokio::test]
async fn test_page_limit_keeps_incoming_bookmark() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "updated_at": "2024-06-01T00:00:00Z"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let stream = medusa_stream(&server.uri(), orders());
    let engine = SyncEngine::new().with_config(SyncConfig::new().with_max_pages(1));
    let sync = engine
        .sync_stream(&stream, Some("2024-05-01T00:00:00Z"))
        .await
        .unwrap();

    assert_eq!(sync.records().count(), 1);
    assert_eq!(sync.bookmark.as_deref(), Some("2024-05-01T00:00:00Z"));
}

#[tokio::test]
async fn test_sync_stream_max_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}, {"id": 2}])))
        .expect(2)
        .mount(&server)
        .await;

    let stream = medusa_stream(&server.uri(), StreamConfig::new("products", "/products"));
    let engine = SyncEngine::new().with_config(SyncConfig::new().with_max_pages(2));
    let sync = engine.sync_stream(&stream, None).await.unwrap();

    assert_eq!(sync.stats.pages_fetched, 2);
    assert_eq!(sync.records().count(), 4);
    assert!(sync
        .messages
        .iter()
        .any(|m| matches!(m, Message::Log { level: LogLevel::Warn, .. })));
}

#[tokio::test]
async fn test_sync_stream_propagates_http_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/orders"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let stream = medusa_stream(&server.uri(), orders());
    let err = SyncEngine::new()
        .sync_stream(&stream, None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpResponse { status: 403, .. }));
    assert!(err.to_string().contains("403 Client Error: Forbidden"));
}

#[tokio::test]
async fn test_sync_all_runs_every_stream() {
    let server = MockServer::start().await;
    mount_order_pages(&server).await;

    Mock::given(method("GET"))
        .and(path("/admin/customers"))
        .and(query_param("created_at[gt]", "2024-02-01T00:00:01Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let streams = vec![
        medusa_stream(&server.uri(), orders()),
        medusa_stream(
            &server.uri(),
            StreamConfig::new("customers", "/customers").with_replication_key("created_at"),
        ),
    ];
    let bookmarks = HashMap::from([(
        "customers".to_string(),
        "2024-02-01T00:00:00Z".to_string(),
    )]);

    let results = SyncEngine::new().sync_all(&streams, &bookmarks).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].stream, "orders");
    assert_eq!(results[0].records().count(), 4);
    assert_eq!(results[1].stream, "customers");
    assert_eq!(
        results[1].bookmark.as_deref(),
        Some("2024-02-01T00:00:00Z")
    );

    let mut total = SyncStats::new();
    for result in &results {
        total.merge(&result.stats);
    }
    assert_eq!(total.streams_synced, 2);
    assert_eq!(total.records_synced, 4);
}
