//! Integration tests for the HTTP surface.
//!
//! Uses Axum's tower integration for in-process testing
//! without starting a real TCP listener.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt; // for oneshot()

use bitmap_cluster::app::{NodeState, build_app};
use bitmap_cluster::dispatcher::protocol::{CacheResponse, ErrorResponse};
use bitmap_cluster::replication::types::PullOutcome;
use bitmap_cluster::storage::types::CacheInfo;

async fn post_json(app: &Router, uri: &str, body: String) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn set_then_get_over_http() {
    let app = build_app(&NodeState::new(1 << 16));

    let (status, body) = post_json(
        &app,
        "/request",
        r#"{"width": 8, "name": "uids", "operator": "SET", "ids": [1, 2, 3, 2]}"#.to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let set: CacheResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(set.ids, vec![1, 2, 3]);
    assert!(set.flags.is_empty());

    let (status, body) = post_json(
        &app,
        "/request",
        r#"{"width": 8, "name": "uids", "operator": "GET", "ids": [3, 4]}"#.to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let get: CacheResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(get.ids, vec![3, 4]);
    assert_eq!(get.flags, vec![1, 0]);
}

#[tokio::test]
async fn shift_without_arrays_is_accepted() {
    let app = build_app(&NodeState::new(1024));

    let (status, body) = post_json(
        &app,
        "/request",
        r#"{"width": 4, "name": "uids", "operator": "SHIFT"}"#.to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response: CacheResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(response, CacheResponse::default());
}

#[tokio::test]
async fn unknown_operator_is_bad_request() {
    let app = build_app(&NodeState::new(1024));

    let (status, body) = post_json(
        &app,
        "/request",
        r#"{"width": 8, "name": "uids", "operator": "DROP", "ids": [1]}"#.to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert!(error.error.contains("DROP"));

    let (_, body) = get_json(&app, "/caches").await;
    let caches: Vec<CacheInfo> = serde_json::from_slice(&body).unwrap();
    assert!(caches.is_empty());
}

#[tokio::test]
async fn width_mismatch_and_length_mismatch_are_bad_requests() {
    let app = build_app(&NodeState::new(1024));
    post_json(
        &app,
        "/request",
        r#"{"width": 2, "name": "uids", "operator": "SET", "ids": [1]}"#.to_string(),
    )
    .await;

    let (status, _) = post_json(
        &app,
        "/request",
        r#"{"width": 32, "name": "uids", "operator": "GET", "ids": [1]}"#.to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_json(
        &app,
        "/request",
        r#"{"width": 2, "name": "uids", "operator": "SYNC", "ids": [1, 2], "flags": [3]}"#
            .to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert!(error.error.contains("mismatch"));

    let (status, _) = post_json(
        &app,
        "/request",
        r#"{"width": 7, "name": "other", "operator": "GET", "ids": [1]}"#.to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn caches_endpoint_reports_stats() {
    let app = build_app(&NodeState::new(1024));
    post_json(
        &app,
        "/request",
        r#"{"width": 16, "name": "uids", "operator": "SET", "ids": [5, 900, 2000]}"#.to_string(),
    )
    .await;

    let (status, body) = get_json(&app, "/caches").await;

    assert_eq!(status, StatusCode::OK);
    let caches: Vec<CacheInfo> = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        caches,
        vec![CacheInfo {
            name: "uids".to_string(),
            width: 16,
            capacity: 1024,
            max_seen_id: 900,
            occupancy: 2,
        }]
    );
}

#[tokio::test]
async fn sync_status_starts_empty() {
    let app = build_app(&NodeState::new(1024));

    let (status, body) = get_json(&app, "/sync/status").await;

    assert_eq!(status, StatusCode::OK);
    let outcomes: Vec<PullOutcome> = serde_json::from_slice(&body).unwrap();
    assert!(outcomes.is_empty());
}

#[tokio::test]
async fn undecodable_bodies_are_json_bad_requests() {
    let app = build_app(&NodeState::new(1024));

    let (status, body) = post_json(
        &app,
        "/request",
        r#"{"width": -1, "name": "uids", "operator": "GET", "ids": [1]}"#.to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.error, "unsupported bit width: -1");

    let (status, body) = post_json(
        &app,
        "/request",
        r#"{"width": 8589934592, "name": "uids", "operator": "GET", "ids": [1]}"#.to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert!(error.error.contains("unsupported bit width"));

    let (status, body) = post_json(
        &app,
        "/request",
        r#"{"width": 8, "name": "uids", "operator": "SYNC", "ids": [1], "flags": [-1]}"#
            .to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert!(error.error.starts_with("malformed request body"), "{}", error.error);

    let (status, body) = post_json(&app, "/reverse_sync", r#"{"addr": 5}"#.to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert!(error.error.starts_with("malformed request body"), "{}", error.error);

    let (_, body) = get_json(&app, "/caches").await;
    let caches: Vec<CacheInfo> = serde_json::from_slice(&body).unwrap();
    assert!(caches.is_empty());
}
