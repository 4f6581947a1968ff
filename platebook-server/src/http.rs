//! Platebook HTTP API
//!
//! Axum server running alongside the Unix socket IPC server, mainly for chat
//! bridges that speak HTTP and for the operator CLI.
//!
//! Each endpoint has a thin axum handler that delegates to an inner function
//! taking the `Dispatcher` directly, so the logic is testable without axum.
//!
//! Endpoints:
//! - GET  /health               — store status and active session
//! - GET  /version              — server version info
//! - POST /message              — raw chat message `{user, text}`
//! - POST /orders               — order line `{user, text}`
//! - POST /sessions             — open a session
//! - POST /sessions/close       — close the active session
//! - GET  /sessions?limit=N     — recent sessions
//! - GET  /sessions/:id/totals  — consolidated totals of one session

use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use platebook_core::ipc::{PlatebookRequest, PlatebookResponse};
use platebook_core::PlatebookConfig;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::dispatcher::Dispatcher;

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub dispatcher: Dispatcher,
    pub config: PlatebookConfig,
}

pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/message", post(message_handler))
        .route("/orders", post(order_handler))
        .route("/sessions", post(open_handler).get(list_handler))
        .route("/sessions/close", post(close_handler))
        .route("/sessions/:id/totals", get(totals_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    dispatcher: Dispatcher,
    config: PlatebookConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let state = Arc::new(HttpState { dispatcher, config });

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Platebook HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub user: String,
    pub text: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
    pub limit: Option<u32>,
}

// ============================================================================
// Inner (directly testable) functions
// ============================================================================

/// Pick the HTTP status for a dispatcher response. User-facing rejections keep
/// their reply text in the body.
pub fn status_for(response: &PlatebookResponse) -> StatusCode {
    if response.is_ok() {
        return StatusCode::OK;
    }
    match response.error.as_deref() {
        Some("format") | Some("missing_session_id") | Some("missing_user") => {
            StatusCode::BAD_REQUEST
        }
        Some("no_active_session") => StatusCode::CONFLICT,
        Some("session_not_found") => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn to_http(response: PlatebookResponse) -> (StatusCode, serde_json::Value) {
    let status = status_for(&response);
    let body = serde_json::to_value(&response).unwrap_or_else(|e| {
        serde_json::json!({
            "status": "error",
            "error": format!("Failed to serialize response: {}", e),
        })
    });
    (status, body)
}

pub async fn health_inner(
    dispatcher: &Dispatcher,
    socket_path: &str,
) -> (StatusCode, serde_json::Value) {
    let response = dispatcher.dispatch(PlatebookRequest::Health).await;
    if !response.is_ok() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({
                "status": "unhealthy",
                "error": response.error,
            }),
        );
    }

    let data = response.data.unwrap_or_default();
    (
        StatusCode::OK,
        serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "sqlite": data["sqlite"],
            "active_session": data["active_session"],
            "socket": socket_path,
        }),
    )
}

pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "platebook/1",
    })
}

pub async fn message_inner(
    dispatcher: &Dispatcher,
    req: MessageRequest,
) -> (StatusCode, serde_json::Value) {
    let request = PlatebookRequest::Message {
        user: req.user,
        text: req.text,
    };
    to_http(dispatcher.dispatch(request).await)
}

pub async fn order_inner(
    dispatcher: &Dispatcher,
    req: MessageRequest,
) -> (StatusCode, serde_json::Value) {
    let request = PlatebookRequest::SubmitOrder {
        user: req.user,
        text: req.text,
    };
    to_http(dispatcher.dispatch(request).await)
}

pub async fn open_inner(dispatcher: &Dispatcher) -> (StatusCode, serde_json::Value) {
    to_http(dispatcher.dispatch(PlatebookRequest::OpenSession).await)
}

pub async fn close_inner(dispatcher: &Dispatcher) -> (StatusCode, serde_json::Value) {
    to_http(dispatcher.dispatch(PlatebookRequest::CloseSession).await)
}

pub async fn list_inner(
    dispatcher: &Dispatcher,
    params: ListParams,
) -> (StatusCode, serde_json::Value) {
    to_http(
        dispatcher
            .dispatch(PlatebookRequest::ListSessions { limit: params.limit })
            .await,
    )
}

pub async fn totals_inner(
    dispatcher: &Dispatcher,
    session_id: String,
) -> (StatusCode, serde_json::Value) {
    to_http(
        dispatcher
            .dispatch(PlatebookRequest::Search {
                session_id: Some(session_id),
            })
            .await,
    )
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state.dispatcher, &state.config.service.socket_path).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn message_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<MessageRequest>,
) -> impl IntoResponse {
    let (status, body) = message_inner(&state.dispatcher, req).await;
    (status, Json(body))
}

pub async fn order_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<MessageRequest>,
) -> impl IntoResponse {
    let (status, body) = order_inner(&state.dispatcher, req).await;
    (status, Json(body))
}

pub async fn open_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = open_inner(&state.dispatcher).await;
    (status, Json(body))
}

pub async fn close_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = close_inner(&state.dispatcher).await;
    (status, Json(body))
}

pub async fn list_handler(
    State(state): State<Arc<HttpState>>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let (status, body) = list_inner(&state.dispatcher, params).await;
    (status, Json(body))
}

pub async fn totals_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let (status, body) = totals_inner(&state.dispatcher, id).await;
    (status, Json(body))
}
