use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use gift_registry::{
    claims::Registry,
    config::ServerConfig,
    notify::NotificationHub,
    server::{handlers, router, AppState},
    storage::{ClaimStore, JsonFileStore, MemoryStore, SqliteStore},
};

fn app_with(store: Arc<dyn ClaimStore>) -> Router {
    let registry = Registry::new(store, NotificationHub::disabled());
    router::init(AppState::new(registry), &ServerConfig::default())
}

fn app() -> Router {
    app_with(Arc::new(SqliteStore::open_in_memory().unwrap()))
}

async fn submit(app: &Router, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/submit")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn names(app: &Router) -> (StatusCode, Value) {
    let request = Request::builder().uri("/api/names").body(Body::empty()).unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn claiming_the_same_item_twice() {
    let app = app();

    let (status, body) = submit(&app, r#"{"Crib": "Ana"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claimedItems"], json!(["Crib: Ana"]));
    assert_eq!(body["alreadyClaimed"], json!([]));
    assert_eq!(body["message"], handlers::MSG_CLAIMED);

    let (status, body) = submit(&app, r#"{"Crib": "Ana"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claimedItems"], json!([]));
    assert_eq!(body["alreadyClaimed"], json!(["Crib"]));
    assert_eq!(body["message"], handlers::MSG_NOTHING_CLAIMED);
}

#[tokio::test]
async fn mixed_batch_reports_both_lists() {
    let app = app();
    submit(&app, r#"{"Stroller": "Bruno"}"#).await;

    let (status, body) = submit(&app, r#"{"Crib": "Ana", "Stroller": "Carla"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claimedItems"], json!(["Crib: Ana"]));
    assert_eq!(body["alreadyClaimed"], json!(["Stroller"]));
    assert!(body.get("failedItems").is_none());
    assert!(body.get("volatile").is_none());
}

#[tokio::test]
async fn names_reflect_claims() {
    let app = app();

    let (status, body) = names(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    submit(&app, r#"{"Crib": "  Ana ", "Bottles": "Bruno"}"#).await;

    let (_, body) = names(&app).await;
    assert_eq!(body, json!({ "Bottles": ["Bruno"], "Crib": ["Ana"] }));
}

#[tokio::test]
async fn registered_items_show_as_available() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    store.register_item("Monitor").unwrap();
    let app = app_with(store);

    let (_, body) = names(&app).await;
    assert_eq!(body, json!({ "Monitor": [] }));

    let (status, body) = submit(&app, r#"{"Monitor": "Eva"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claimedItems"], json!(["Monitor: Eva"]));

    let (_, body) = names(&app).await;
    assert_eq!(body, json!({ "Monitor": ["Eva"] }));
}

#[tokio::test]
async fn blank_names_claim_nothing() {
    let app = app();

    let (status, body) = submit(&app, r#"{"Crib": "   ", "Stroller": ""}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], handlers::MSG_NOTHING_CLAIMED);
    assert_eq!(body["claimedItems"], json!([]));
    assert_eq!(body["alreadyClaimed"], json!([]));

    let (_, body) = names(&app).await;
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn malformed_submissions_are_client_errors() {
    let app = app();

    for payload in ["{}", "not json", r#"["Crib"]"#, r#"{"Crib": 3}"#, r#"{"": "Ana"}"#] {
        let (status, body) = submit(&app, payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
        assert!(body["error"].is_string(), "payload {}", payload);
    }

    let (_, body) = names(&app).await;
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn volatile_store_is_flagged() {
    let app = app_with(Arc::new(MemoryStore::new()));

    let (status, body) = submit(&app, r#"{"Crib": "Ana"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["volatile"], json!(true));

    let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["storage"], "memory");
    assert_eq!(body["durable"], json!(false));
}

#[tokio::test]
async fn unreadable_store_still_answers_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("names.json");
    let store = JsonFileStore::open(&path).unwrap();
    std::fs::write(&path, "{ broken").unwrap();

    let app = app_with(Arc::new(store));
    let (status, body) = names(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn write_failure_is_a_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("names.json");
    let store = JsonFileStore::open(&path).unwrap();
    std::fs::write(&path, "{ broken").unwrap();

    let app = app_with(Arc::new(store));
    let (status, body) = submit(&app, r#"{"Crib": "Ana"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], handlers::MSG_SAVE_FAILED);
    assert_eq!(body["failedItems"], json!(["Crib"]));
    assert_eq!(body["claimedItems"], json!([]));
}

#[tokio::test]
async fn concurrent_submissions_have_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(SqliteStore::open(dir.path().join("names.db")).unwrap()));

    let tasks: Vec<_> = (0..10)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let body = format!(r#"{{"Crib": "guest-{}"}}"#, i);
                submit(&app, &body).await
            })
        })
        .collect();

    let mut winners = 0;
    let mut losers = 0;
    for task in tasks {
        let (status, body) = task.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        if body["claimedItems"].as_array().map_or(false, |a| !a.is_empty()) {
            winners += 1;
        } else {
            assert_eq!(body["alreadyClaimed"], json!(["Crib"]));
            losers += 1;
        }
    }
    assert_eq!((winners, losers), (1, 9));
}
