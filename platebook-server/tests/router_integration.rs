use std::sync::Arc;

use platebook_core::config::{DatabaseConfig, OrdersConfig};
use platebook_core::ipc::PlatebookRequest;
use platebook_core::{OrderService, SqliteOrderStore};
use platebook_server::router;
use tempfile::TempDir;

async fn make_service() -> (OrderService, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        path: dir.path().join("orders.db").display().to_string(),
        max_connections: 2,
    };
    let pool = platebook_core::db::create_pool(&config).await.unwrap();
    let store = Arc::new(SqliteOrderStore::new(pool));
    (OrderService::new(store, OrdersConfig::default()), dir)
}

fn message(user: &str, text: &str) -> PlatebookRequest {
    PlatebookRequest::Message {
        user: user.to_string(),
        text: text.to_string(),
    }
}

#[tokio::test]
async fn test_chat_flow_end_to_end() {
    let (service, _dir) = make_service().await;

    let opened = router::handle_request(message("host", "/open-session"), &service).await;
    assert_eq!(opened.status, "ok");
    let reply = opened.reply.unwrap();
    assert!(reply.starts_with("New session created! Session ID: "), "{reply}");
    let session_id = opened.data.unwrap()["session_id"].as_str().unwrap().to_string();
    assert!(reply.ends_with(&session_id));

    for (user, text) in [("alice", "3 2"), ("bob", "3 1"), ("alice", "3 1")] {
        let resp = router::handle_request(message(user, text), &service).await;
        assert_eq!(resp.reply.as_deref(), Some("Order saved for plate n. 3"));
    }

    let closed = router::handle_request(message("host", "/close-session"), &service).await;
    assert_eq!(closed.status, "ok");
    assert_eq!(
        closed.reply.as_deref().unwrap(),
        format!("Orders for session {session_id}:\nplate n. 3: 4")
    );

    let search = router::handle_request(message("host", &format!("/search {session_id}")), &service).await;
    assert_eq!(search.reply, closed.reply);
}

#[tokio::test]
async fn test_order_without_session() {
    let (service, _dir) = make_service().await;
    let resp = router::handle_request(message("alice", "3 2"), &service).await;
    assert_eq!(resp.status, "error");
    assert_eq!(resp.error.as_deref(), Some("no_active_session"));
    assert_eq!(resp.reply.as_deref(), Some("No active session. Wait for a new session"));

    let list = router::handle_request(PlatebookRequest::ListSessions { limit: None }, &service).await;
    assert_eq!(list.reply.as_deref(), Some("No sessions saved"));
}

#[tokio::test]
async fn test_wrong_format_reply() {
    let (service, _dir) = make_service().await;
    router::handle_request(PlatebookRequest::OpenSession, &service).await;

    let resp = router::handle_request(message("alice", "abc 2"), &service).await;
    assert_eq!(resp.error.as_deref(), Some("format"));
    assert_eq!(resp.reply.as_deref(), Some("Wrong format! Use: 'plate_number quantity'."));
}

#[tokio::test]
async fn test_blank_user_is_rejected_on_every_request_shape() {
    let (service, _dir) = make_service().await;
    let opened = router::handle_request(PlatebookRequest::OpenSession, &service).await;
    let session_id = opened.data.unwrap()["session_id"].as_str().unwrap().to_string();

    let requests = [
        message("", "3 2"),
        PlatebookRequest::SubmitOrder {
            user: "  ".to_string(),
            text: "3 2".to_string(),
        },
    ];
    for request in requests {
        let resp = router::handle_request(request, &service).await;
        assert_eq!(resp.error.as_deref(), Some("missing_user"));
        assert_eq!(resp.reply.as_deref(), Some("No user name provided!"));
    }

    let search = PlatebookRequest::Search { session_id: Some(session_id) };
    let resp = router::handle_request(search, &service).await;
    assert_eq!(resp.reply.as_deref(), Some("No orders found!"));
}

#[tokio::test]
async fn test_close_replies() {
    let (service, _dir) = make_service().await;

    let resp = router::handle_request(PlatebookRequest::CloseSession, &service).await;
    assert_eq!(resp.reply.as_deref(), Some("No Active session"));

    router::handle_request(PlatebookRequest::OpenSession, &service).await;
    let resp = router::handle_request(PlatebookRequest::CloseSession, &service).await;
    assert_eq!(resp.status, "ok");
    assert_eq!(resp.reply.as_deref(), Some("No orders found!"));
}

#[tokio::test]
async fn test_search_replies() {
    let (service, _dir) = make_service().await;

    let resp = router::handle_request(message("host", "/search"), &service).await;
    assert_eq!(resp.reply.as_deref(), Some("No Session ID provided!"));

    let resp = router::handle_request(
        PlatebookRequest::Search { session_id: Some("deadbeef".to_string()) },
        &service,
    )
    .await;
    assert_eq!(resp.error.as_deref(), Some("session_not_found"));
    assert_eq!(resp.reply.as_deref(), Some("Session deadbeef not found!"));
}

#[tokio::test]
async fn test_list_sessions_reply_lines() {
    let (service, _dir) = make_service().await;
    let first = router::handle_request(PlatebookRequest::OpenSession, &service).await;
    let second = router::handle_request(PlatebookRequest::OpenSession, &service).await;
    let first_id = first.data.unwrap()["session_id"].as_str().unwrap().to_string();
    let second_id = second.data.unwrap()["session_id"].as_str().unwrap().to_string();

    let resp = router::handle_request(message("host", "/list-sessions"), &service).await;
    let reply = resp.reply.unwrap();
    let lines: Vec<&str> = reply.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with(&format!("{second_id}-true-")), "{reply}");
    assert!(lines[1].starts_with(&format!("{first_id}-false-")), "{reply}");
}

#[tokio::test]
async fn test_help_and_health() {
    let (service, _dir) = make_service().await;

    let resp = router::handle_request(message("alice", "/start"), &service).await;
    assert!(resp.reply.unwrap().contains("/open-session"));

    let resp = router::handle_request(PlatebookRequest::Health, &service).await;
    assert_eq!(resp.status, "ok");
    let data = resp.data.unwrap();
    assert!(data["sqlite"].is_string());
    assert!(data["active_session"].is_null());
}
