//! Integration tests for the Raindrop.io client.
//!
//! These tests start a real axum server on a random port that answers like
//! the Raindrop REST API and point a `RaindropClient` at it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use tidymark::error::SourceError;
use tidymark::source::{BookmarkSource, RaindropClient};

/// A request as the mock server saw it.
#[derive(Debug, Clone)]
struct Seen {
    method: Method,
    path: String,
    query: String,
    auth: String,
    body: String,
}

#[derive(Clone, Default)]
struct Mock {
    routes: Arc<HashMap<(Method, String), (StatusCode, String)>>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

async fn answer(
    State(mock): State<Mock>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let path = uri.path().to_string();
    mock.seen.lock().unwrap().push(Seen {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().unwrap_or_default().to_string(),
        auth: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
        body,
    });
    mock.routes
        .get(&(method, path))
        .cloned()
        .unwrap_or((StatusCode::NOT_FOUND, r#"{"result":false}"#.into()))
}

/// Helper: spawn the mock on port 0 and return a client pointed at it.
async fn spawn_mock(
    routes: Vec<(Method, &str, StatusCode, serde_json::Value)>,
) -> (RaindropClient, Arc<Mutex<Vec<Seen>>>) {
    let routes = routes
        .into_iter()
        .map(|(method, path, status, body)| {
            ((method, format!("/rest/v1{path}")), (status, body.to_string()))
        })
        .collect();
    let mock = Mock {
        routes: Arc::new(routes),
        ..Default::default()
    };
    let seen = mock.seen.clone();
    let app = Router::new().fallback(answer).with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = RaindropClient::new("test-token")
        .unwrap()
        .with_base_url(format!("http://{addr}/rest/v1"));
    (client, seen)
}

// ── Reads ────────────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_page_sends_paging_and_auth() {
    let (client, seen) = spawn_mock(vec![(
        Method::GET,
        "/raindrops/42",
        StatusCode::OK,
        serde_json::json!({
            "result": true,
            "items": [
                {
                    "_id": 100,
                    "title": "Rust book",
                    "link": "https://doc.rust-lang.org/book/",
                    "domain": "doc.rust-lang.org",
                    "excerpt": "The Rust Programming Language",
                    "created": "2024-03-01T10:00:00.000Z",
                    "collection": {"$id": 42}
                },
                {"_id": 101}
            ]
        }),
    )])
    .await;

    let page = client.fetch_page(42, 2).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id, 100);
    assert_eq!(page[0].domain, "doc.rust-lang.org");
    assert_eq!(page[0].created_date(), "2024-03-01");
    assert_eq!(page[0].collection_id, Some(42));
    assert_eq!(page[1].title, "Untitled");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].auth, "Bearer test-token");
    assert!(seen[0].query.contains("page=2"));
    assert!(seen[0].query.contains("perpage=50"));
    assert!(seen[0].query.contains("sort=-created"));
}

#[tokio::test]
async fn empty_page_means_no_more_data() {
    let (client, _seen) = spawn_mock(vec![(
        Method::GET,
        "/raindrops/7",
        StatusCode::OK,
        serde_json::json!({"result": true, "items": []}),
    )])
    .await;

    assert!(client.fetch_page(7, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn fetch_failure_is_an_error_not_an_empty_page() {
    let (client, _seen) = spawn_mock(vec![(
        Method::GET,
        "/raindrops/7",
        StatusCode::UNAUTHORIZED,
        serde_json::json!({"result": false, "errorMessage": "Unauthorized"}),
    )])
    .await;

    let err = client.fetch_page(7, 0).await.unwrap_err();
    assert!(matches!(err, SourceError::Status { status: 401, .. }));
}

#[tokio::test]
async fn collections_include_nested_children_once() {
    let (client, _seen) = spawn_mock(vec![
        (
            Method::GET,
            "/collections",
            StatusCode::OK,
            serde_json::json!({"result": true, "items": [
                {"_id": 1, "title": "Inbox", "count": 12},
                {"_id": 2, "title": "Development", "count": 3}
            ]}),
        ),
        (
            Method::GET,
            "/collections/childrens",
            StatusCode::OK,
            serde_json::json!({"result": true, "items": [
                {"_id": 2, "title": "Development", "count": 3},
                {"_id": 3, "title": "Rust", "count": 8}
            ]}),
        ),
    ])
    .await;

    let collections = client.list_collections().await.unwrap();
    let ids: Vec<i64> = collections.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(collections[0].count, 12);
    assert_eq!(client.resolve_collection_by_name(&collections, "rust"), Some(3));
}

#[tokio::test]
async fn children_failure_still_returns_roots() {
    let (client, _seen) = spawn_mock(vec![(
        Method::GET,
        "/collections",
        StatusCode::OK,
        serde_json::json!({"result": true, "items": [{"_id": 1, "title": "Inbox"}]}),
    )])
    .await;

    let collections = client.list_collections().await.unwrap();
    assert_eq!(collections.len(), 1);
    assert_eq!(collections[0].title, "Inbox");
    assert_eq!(collections[0].count, 0);
}

// ── Mutations ────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_hits_the_item_endpoint() {
    let (client, seen) = spawn_mock(vec![(
        Method::DELETE,
        "/raindrop/55",
        StatusCode::OK,
        serde_json::json!({"result": true}),
    )])
    .await;

    client.delete(55).await.unwrap();
    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].method, Method::DELETE);
    assert_eq!(seen[0].path, "/rest/v1/raindrop/55");
}

#[tokio::test]
async fn rejected_delete_is_an_error() {
    let (client, _seen) = spawn_mock(vec![(
        Method::DELETE,
        "/raindrop/55",
        StatusCode::OK,
        serde_json::json!({"result": false, "errorMessage": "not found"}),
    )])
    .await;

    let err = client.delete(55).await.unwrap_err();
    assert!(matches!(err, SourceError::Rejected(msg) if msg == "not found"));
}

#[tokio::test]
async fn move_puts_the_target_collection() {
    let (client, seen) = spawn_mock(vec![(
        Method::PUT,
        "/raindrop/55",
        StatusCode::OK,
        serde_json::json!({"result": true, "item": {"_id": 55}}),
    )])
    .await;

    client.move_to_collection(55, 9).await.unwrap();
    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].method, Method::PUT);
    let body: serde_json::Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(body, serde_json::json!({"collection": {"$id": 9}}));
}
