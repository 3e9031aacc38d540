use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use service::errors::ServiceError;
use service::storage::{memory_store::MemoryStore, UserStore};
use tower::ServiceExt;

use configs::ServerConfig;
use server::startup::build_app;

/// Memory store that counts how often it is touched.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
}

#[async_trait]
impl UserStore for CountingStore {
    async fn hset(&self, key: &str, fields: &[(String, String)]) -> Result<(), ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.hset(key, fields).await
    }
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.hgetall(key).await
    }
    async fn ping(&self) -> Result<(), ServiceError> { Ok(()) }
    async fn close(&self) -> Result<(), ServiceError> { Ok(()) }
}

/// Store whose every command fails as an unreachable server would.
struct DownStore;

#[async_trait]
impl UserStore for DownStore {
    async fn hset(&self, _key: &str, _fields: &[(String, String)]) -> Result<(), ServiceError> {
        Err(ServiceError::Store("connection refused".into()))
    }
    async fn hgetall(&self, _key: &str) -> Result<HashMap<String, String>, ServiceError> {
        Err(ServiceError::Store("connection refused".into()))
    }
    async fn ping(&self) -> Result<(), ServiceError> {
        Err(ServiceError::Store("connection refused".into()))
    }
    async fn close(&self) -> Result<(), ServiceError> { Ok(()) }
}

fn app_with(store: Arc<dyn UserStore>) -> Router {
    build_app(store, &ServerConfig::default())
}

fn app_with_limit(store: Arc<dyn UserStore>, max_body_bytes: usize) -> Router {
    build_app(store, &ServerConfig { max_body_bytes, ..ServerConfig::default() })
}

fn post_user(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/users/")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn get_user(id: &str) -> Request<Body> {
    Request::builder().method("GET").uri(format!("/users/{id}")).body(Body::empty()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> anyhow::Result<(StatusCode, Option<String>, Vec<u8>)> {
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = to_bytes(resp.into_body(), usize::MAX).await?.to_vec();
    Ok((status, content_type, body))
}

#[tokio::test]
async fn create_then_get_round_trip() -> anyhow::Result<()> {
    let app = app_with(Arc::new(MemoryStore::new()));

    let (status, _, body) = send(&app, post_user(r#"{"id":"42","name":"Ada"}"#)).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.is_empty());

    let (status, content_type, body) = send(&app, get_user("42")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let got: Value = serde_json::from_slice(&body)?;
    assert_eq!(got, json!({"id": "42", "name": "Ada"}));
    Ok(())
}

#[tokio::test]
async fn non_string_values_come_back_as_strings() -> anyhow::Result<()> {
    let app = app_with(Arc::new(MemoryStore::new()));
    let payload = json!({"id": "7", "age": 36, "active": true, "nick": null});
    let (status, _, _) = send(&app, post_user(serde_json::to_vec(&payload)?)).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (_, _, body) = send(&app, get_user("7")).await?;
    let got: Value = serde_json::from_slice(&body)?;
    assert_eq!(got, json!({"id": "7", "age": "36", "active": "true", "nick": ""}));
    Ok(())
}

#[tokio::test]
async fn unknown_user_is_404_with_empty_body() -> anyhow::Result<()> {
    let app = app_with(Arc::new(MemoryStore::new()));
    let (status, content_type, body) = send(&app, get_user("999")).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());
    assert_ne!(content_type.as_deref(), Some("application/json"));
    Ok(())
}

#[tokio::test]
async fn second_create_overwrites_submitted_fields() -> anyhow::Result<()> {
    let app = app_with(Arc::new(MemoryStore::new()));
    send(&app, post_user(r#"{"id":"1","name":"Ada","city":"London"}"#)).await?;
    send(&app, post_user(r#"{"id":"1","name":"Grace"}"#)).await?;

    let (_, _, body) = send(&app, get_user("1")).await?;
    let got: Value = serde_json::from_slice(&body)?;
    assert_eq!(got["name"], "Grace");
    // HSET merges at field level; fields absent from the second write survive.
    assert_eq!(got["city"], "London");
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_400_and_store_untouched() -> anyhow::Result<()> {
    let store = Arc::new(CountingStore::default());
    let app = app_with(store.clone());

    let (status, _, body) = send(&app, post_user("not json")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let err: Value = serde_json::from_slice(&body)?;
    assert_eq!(err["error"], "Bad Request");
    assert!(err["message"].as_str().unwrap_or_default().contains("line 1"));
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    assert!(store.inner.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn missing_or_bad_id_is_400_and_store_untouched() -> anyhow::Result<()> {
    let store = Arc::new(CountingStore::default());
    let app = app_with(store.clone());

    for body in [r#"{"name":"Ada"}"#, r#"{"id":42}"#, r#"[1,2]"#, r#"{"id":"1","tags":["a"]}"#] {
        let (status, _, resp) = send(&app, post_user(body)).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        let err: Value = serde_json::from_slice(&resp)?;
        assert!(err["message"].is_string(), "body: {body}");
    }
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn create_without_content_type_is_accepted() -> anyhow::Result<()> {
    let app = app_with(Arc::new(MemoryStore::new()));
    let req = Request::builder()
        .method("POST")
        .uri("/users/")
        .body(Body::from(r#"{"id":"plain"}"#))?;
    let (status, _, _) = send(&app, req).await?;
    assert_eq!(status, StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn store_failure_is_500_with_message() -> anyhow::Result<()> {
    let app = app_with(Arc::new(DownStore));

    let (status, _, body) = send(&app, post_user(r#"{"id":"1"}"#)).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let err: Value = serde_json::from_slice(&body)?;
    assert_eq!(err["message"], "store error: connection refused");

    let (status, _, body) = send(&app, get_user("1")).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let err: Value = serde_json::from_slice(&body)?;
    assert_eq!(err["message"], "store error: connection refused");
    Ok(())
}

#[tokio::test]
async fn health_ok() -> anyhow::Result<()> {
    let app = app_with(Arc::new(MemoryStore::new()));
    let req = Request::builder().uri("/health").body(Body::empty())?;
    let (status, _, body) = send(&app, req).await?;
    assert_eq!(status, StatusCode::OK);
    let got: Value = serde_json::from_slice(&body)?;
    assert_eq!(got["status"], "ok");
    Ok(())
}

fn object_with_bio(id: &str, bio_len: usize) -> Vec<u8> {
    serde_json::to_vec(&json!({"id": id, "bio": "x".repeat(bio_len)})).unwrap()
}

#[tokio::test]
async fn body_over_axum_default_limit_is_stored() -> anyhow::Result<()> {
    let app = app_with(Arc::new(MemoryStore::new()));
    let (status, _, _) = send(&app, post_user(object_with_bio("big", 3 * 1024 * 1024))).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, body) = send(&app, get_user("big")).await?;
    assert_eq!(status, StatusCode::OK);
    let got: Value = serde_json::from_slice(&body)?;
    assert_eq!(got["bio"].as_str().map(str::len), Some(3 * 1024 * 1024));
    Ok(())
}

#[tokio::test]
async fn body_over_configured_limit_is_413_json_and_store_untouched() -> anyhow::Result<()> {
    let store = Arc::new(CountingStore::default());
    let app = app_with_limit(store.clone(), 1024);

    let (status, content_type, body) = send(&app, post_user(object_with_bio("big", 4096))).await?;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let err: Value = serde_json::from_slice(&body)?;
    assert_eq!(err["error"], "Payload Too Large");
    assert!(err["message"].is_string());
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn zero_limit_accepts_large_bodies() -> anyhow::Result<()> {
    let app = app_with_limit(Arc::new(MemoryStore::new()), 0);
    let (status, _, _) = send(&app, post_user(object_with_bio("huge", 5 * 1024 * 1024))).await?;
    assert_eq!(status, StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn non_utf8_user_id_is_400_json() -> anyhow::Result<()> {
    let store = Arc::new(CountingStore::default());
    let app = app_with(store.clone());

    let (status, content_type, body) = send(&app, get_user("%FF")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let err: Value = serde_json::from_slice(&body)?;
    assert_eq!(err["error"], "Bad Request");
    assert!(err["message"].as_str().unwrap_or_default().contains("UTF-8"));
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    Ok(())
}
