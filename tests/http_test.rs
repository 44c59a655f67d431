//! HTTP route tests driven through the router in-process.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use common::{count_rows, wait_for, TestFixture};
use datasilo::queue::JobQueue;
use datasilo::server::{app, ServerState};
use datasilo::storage::reader::ReaderPool;
use datasilo::storage::{SqliteStore, WriteLock};
use serde_json::{json, Value};
use tower::ServiceExt;

struct Harness {
    fixture: TestFixture,
    state: Arc<ServerState>,
    queue: JobQueue,
}

impl Harness {
    fn new() -> Self {
        let fixture = TestFixture::new();
        let lock = WriteLock::new(SqliteStore::open(&fixture.db_path).unwrap());
        let queue = JobQueue::spawn(lock.clone(), 16).unwrap();
        let state = Arc::new(ServerState {
            queue: queue.handle(),
            lock,
            reader_pool: ReaderPool::new(&fixture.db_path, 2).unwrap(),
        });
        Self {
            fixture,
            state,
            queue,
        }
    }

    fn router(&self) -> Router {
        app(Arc::clone(&self.state))
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn create_events(&self) {
        let (status, _) = self
            .get("/create?table=events&col=user+TEXT&col=action+TEXT")
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    async fn stop(self) {
        self.state.queue.shutdown().await.unwrap();
        self.queue.join().unwrap();
    }
}

#[tokio::test]
async fn test_create_insert_query_delete() {
    let harness = Harness::new();
    harness.create_events().await;

    let (status, body) = harness.get("/insert?table=events&val=u1&val=click").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "queued");
    assert!(body["job_id"].as_str().is_some_and(|id| !id.is_empty()));

    let (status, _) = harness
        .get("/insert?table=events&col=action&col=user&val=view&val=u2")
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let reader = harness.fixture.reader();
    assert!(wait_for(Duration::from_secs(5), || count_rows(&reader, "events") == 2).await);

    let (status, rows) = harness.get("/query?table=events&col=user&val=u2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
    assert_eq!(rows[0]["action"], "view");

    let (status, body) = harness.get("/delete?table=events&col=user&val=u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "deleted": 1 }));

    let (_, rows) = harness.get("/query?table=events").await;
    assert_eq!(rows.as_array().map(Vec::len), Some(1));

    harness.stop().await;
}

#[tokio::test]
async fn test_insert_json_body() {
    let harness = Harness::new();
    harness.create_events().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/insert")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "table": "events", "columns": ["user", "action"], "values": ["u9", "buy"] })
                .to_string(),
        ))
        .unwrap();
    let (status, _) = harness.send(request).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let reader = harness.fixture.reader();
    assert!(wait_for(Duration::from_secs(5), || count_rows(&reader, "events") == 1).await);
    harness.stop().await;
}

#[tokio::test]
async fn test_request_validation() {
    let harness = Harness::new();
    harness.create_events().await;

    let (status, body) = harness.get("/insert?val=x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing table");

    let (status, _) = harness.get("/insert?table=events").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = harness.get("/insert?table=events&col=user&val=a&val=b").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = harness.get("/create?table=bad%20name&col=a+TEXT").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = harness.get("/create?table=t&col=date+TEXT").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = harness.get("/query?table=missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = harness.get("/delete?table=events&col=user").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    harness.stop().await;
}

#[tokio::test]
async fn test_insert_after_shutdown_is_unavailable() {
    let harness = Harness::new();
    harness.create_events().await;
    harness.state.queue.shutdown().await.unwrap();
    let queue = harness.state.queue.clone();
    assert!(wait_for(Duration::from_secs(5), || queue.is_closed()).await);

    let (status, _) = harness.get("/insert?table=events&val=u&val=a").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = harness.get("/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
