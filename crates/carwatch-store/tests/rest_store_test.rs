//! Request-shape tests for `RestDataStore` against a wiremock backend.
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | POST   | `/rest/v1/{table}` | `insert_*` |
//! | GET    | `/rest/v1/{table}` | `select_*` |
//! | PATCH  | `/rest/v1/{table}?id=eq.{id}` | `update_*` |
//! | POST   | `/storage/v1/object/{bucket}/{path}` | `upload_*` |

use carwatch_store::{DataStore, Filter, Order, RestDataStore, StoreConfig, StoreError};
use serde_json::json;
use wiremock::matchers::{body_bytes, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_store(mock_server: &MockServer) -> RestDataStore {
    let config = StoreConfig::new(&mock_server.uri(), "test-key")
        .unwrap()
        .with_timeout(5);
    RestDataStore::new(config).unwrap()
}

// ── POST /rest/v1/{table} ────────────────────────────────────────────

#[tokio::test]
async fn insert_posts_row_with_auth_and_representation_headers() {
    let mock_server = MockServer::start().await;
    let row = json!({"id": "r1", "car_id": "c1", "status": "pending"});

    Mock::given(method("POST"))
        .and(path("/rest/v1/ownership_verification"))
        .and(header("apikey", "test-key"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("prefer", "return=representation"))
        .and(body_json(&row))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([{"id": "r1", "car_id": "c1", "status": "pending", "extra": 1}])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = test_store(&mock_server);
    let stored = store.insert("ownership_verification", row).await.unwrap();
    assert_eq!(stored["extra"], 1);
}

#[tokio::test]
async fn insert_surfaces_api_errors_without_retrying() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/ownership_verification"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = test_store(&mock_server);
    let err = store
        .insert("ownership_verification", json!({"id": "r1"}))
        .await
        .unwrap_err();
    match err {
        StoreError::Api { status, body, .. } => {
            assert_eq!(status, 503);
            assert_eq!(body, "overloaded");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

// ── GET /rest/v1/{table} ─────────────────────────────────────────────

#[tokio::test]
async fn select_latest_sends_eq_filters_order_and_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/ownership_verification"))
        .and(query_param("select", "*"))
        .and(query_param("car_id", "eq.c1"))
        .and(query_param("owner_email", "eq.owner@example.com"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "newest"}])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = test_store(&mock_server);
    let filter = Filter::new()
        .eq("car_id", "c1")
        .eq("owner_email", "owner@example.com");
    let row = store
        .select_latest("ownership_verification", &filter, "created_at")
        .await
        .unwrap();
    assert_eq!(row["id"], "newest");
}

#[tokio::test]
async fn select_latest_with_no_rows_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/ownership_verification"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let store = test_store(&mock_server);
    let err = store
        .select_latest("ownership_verification", &Filter::new().eq("car_id", "c1"), "created_at")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn select_ascending_without_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/cars"))
        .and(query_param("order", "year.asc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": "a"}, {"id": "b"}])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = test_store(&mock_server);
    let rows = store
        .select("cars", &Filter::new(), Some(&Order::asc("year")), None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn select_rejects_non_array_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/cars"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"oops\": true}"))
        .mount(&mock_server)
        .await;

    let store = test_store(&mock_server);
    let err = store
        .select("cars", &Filter::new(), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Decode { .. }));
}

// ── PATCH /rest/v1/{table}?id=eq.{id} ────────────────────────────────

#[tokio::test]
async fn update_patches_by_id() {
    let mock_server = MockServer::start().await;
    let patch = json!({"status": "verified"});

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/ownership_verification"))
        .and(query_param("id", "eq.r1"))
        .and(body_json(&patch))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": "r1", "status": "verified"}])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = test_store(&mock_server);
    store
        .update("ownership_verification", "r1", patch)
        .await
        .unwrap();
}

#[tokio::test]
async fn update_matching_nothing_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/ownership_verification"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let store = test_store(&mock_server);
    let err = store
        .update("ownership_verification", "missing", json!({"status": "rejected"}))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

// ── POST /storage/v1/object/{bucket}/{path} ──────────────────────────

#[tokio::test]
async fn upload_posts_bytes_with_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/storage/v1/object/car-images/license_c1_1000.png"))
        .and(header("content-type", "image/png"))
        .and(header("apikey", "test-key"))
        .and(body_bytes(vec![0x89, 0x50, 0x4E, 0x47]))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "car-images/license_c1_1000.png"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = test_store(&mock_server);
    store
        .upload_file(
            "car-images",
            "license_c1_1000.png",
            "image/png",
            vec![0x89, 0x50, 0x4E, 0x47],
        )
        .await
        .unwrap();

    assert_eq!(
        store.public_url("car-images", "license_c1_1000.png"),
        format!(
            "{}/storage/v1/object/public/car-images/license_c1_1000.png",
            mock_server.uri()
        )
    );
}

#[tokio::test]
async fn upload_failure_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/storage/v1/object/car-images/ownership_c1_1000.jpg"))
        .respond_with(ResponseTemplate::new(413).set_body_string("Payload too large"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = test_store(&mock_server);
    let err = store
        .upload_file("car-images", "ownership_c1_1000.jpg", "image/jpeg", vec![0; 16])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Api { status: 413, .. }));
}
