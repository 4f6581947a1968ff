//! HTTP integration tests: inner functions plus full axum dispatch via `oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use platebook_core::config::DatabaseConfig;
use platebook_core::{OrderService, PlatebookConfig, SqliteOrderStore};
use platebook_server::dispatcher::Dispatcher;
use platebook_server::http::{
    build_router, close_inner, health_inner, message_inner, open_inner, order_inner,
    HttpState, MessageRequest,
};
use tempfile::TempDir;
use tower::ServiceExt;

async fn make_state() -> (Arc<HttpState>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = PlatebookConfig::default();
    config.database = DatabaseConfig {
        path: dir.path().join("orders.db").display().to_string(),
        max_connections: 2,
    };
    let pool = platebook_core::db::create_pool(&config.database).await.unwrap();
    let service = OrderService::new(Arc::new(SqliteOrderStore::new(pool)), config.orders.clone());
    let (dispatcher, _task) = Dispatcher::spawn(service, 8);
    (Arc::new(HttpState { dispatcher, config }), dir)
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_inner_reports_sqlite() {
    let (state, _dir) = make_state().await;
    let (status, body) = health_inner(&state.dispatcher, "/tmp/platebook.sock").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["sqlite"].is_string());
    assert_eq!(body["socket"], "/tmp/platebook.sock");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_inner_functions_status_codes() {
    let (state, _dir) = make_state().await;
    let d = &state.dispatcher;

    let (status, body) = close_inner(d).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reply"], "No Active session");

    let (status, _) = open_inner(d).await;
    assert_eq!(status, StatusCode::OK);

    let bad = MessageRequest { user: "alice".to_string(), text: "x y".to_string() };
    let (status, body) = order_inner(d, bad).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "format");

    let nobody = MessageRequest { user: " ".to_string(), text: "1 1".to_string() };
    let (status, body) = message_inner(d, nobody).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing_user");
    assert_eq!(body["reply"], "No user name provided!");

    let good = MessageRequest { user: "alice".to_string(), text: "9 3".to_string() };
    let (status, body) = message_inner(d, good).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "Order saved for plate n. 9");
    assert_eq!(body["data"]["quantity"], 3);
}

#[tokio::test]
async fn test_version_endpoint() {
    let (state, _dir) = make_state().await;
    let resp = build_router(state).oneshot(empty_request("GET", "/version")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["protocol"], "platebook/1");
}

#[tokio::test]
async fn test_session_lifecycle_over_http() {
    let (state, _dir) = make_state().await;
    let app = build_router(state);

    let resp = app.clone().oneshot(empty_request("POST", "/sessions")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let session_id = body_json(resp).await["data"]["session_id"].as_str().unwrap().to_string();

    for (user, text) in [("alice", "3 2"), ("bob", "3 1"), ("alice", "3 1")] {
        let resp = app
            .clone()
            .oneshot(json_request("POST", "/orders", serde_json::json!({"user": user, "text": text})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = app.clone().oneshot(empty_request("POST", "/sessions/close")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let closed = body_json(resp).await;
    assert_eq!(closed["data"]["totals"][0]["total_quantity"], 4);

    let uri = format!("/sessions/{session_id}/totals");
    let resp = app.clone().oneshot(empty_request("GET", &uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let searched = body_json(resp).await;
    assert_eq!(searched["reply"], closed["reply"]);

    let resp = app.clone().oneshot(empty_request("GET", "/sessions?limit=5")).await.unwrap();
    let listed = body_json(resp).await;
    assert_eq!(listed["data"]["sessions"].as_array().unwrap().len(), 1);
    assert_eq!(listed["data"]["sessions"][0]["active"], false);
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let (state, _dir) = make_state().await;
    let resp = build_router(state)
        .oneshot(empty_request("GET", "/sessions/ffffffff/totals"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["reply"], "Session ffffffff not found!");
}

#[tokio::test]
async fn test_message_endpoint_routes_commands() {
    let (state, _dir) = make_state().await;
    let app = build_router(state);

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/message", serde_json::json!({"user": "host", "text": "/open-session"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let reply = body_json(resp).await["reply"].as_str().unwrap().to_string();
    assert!(reply.starts_with("New session created!"));

    let resp = app
        .oneshot(json_request("POST", "/message", serde_json::json!({"user": "host", "text": "/list-sessions"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
