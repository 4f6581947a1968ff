use platebook_core::command::Command;
use platebook_core::ipc::{PlatebookRequest, PlatebookResponse};
use platebook_core::reply::{self, Operation};
use platebook_core::{OrderError, OrderService};

pub async fn handle_request(request: PlatebookRequest, service: &OrderService) -> PlatebookResponse {
    match request {
        PlatebookRequest::Ping => PlatebookResponse::pong(),
        PlatebookRequest::Health => handle_health(service).await,
        PlatebookRequest::Message { user, text } => handle_message(&user, &text, service).await,
        PlatebookRequest::OpenSession => handle_open(service).await,
        PlatebookRequest::CloseSession => handle_close(service).await,
        PlatebookRequest::SubmitOrder { user, text } => handle_order(&user, &text, service).await,
        PlatebookRequest::Search { session_id } => {
            handle_search(session_id.as_deref().unwrap_or(""), service).await
        }
        PlatebookRequest::ListSessions { limit } => handle_list(limit, service).await,
    }
}

/// Route a raw chat message the way a chat bridge would.
async fn handle_message(user: &str, text: &str, service: &OrderService) -> PlatebookResponse {
    match Command::parse(text) {
        Command::OpenSession => handle_open(service).await,
        Command::CloseSession => handle_close(service).await,
        Command::Search(id) => handle_search(id.as_deref().unwrap_or(""), service).await,
        Command::ListSessions => handle_list(None, service).await,
        Command::Help => PlatebookResponse::ok(reply::USAGE, serde_json::json!({})),
        Command::Order(line) => handle_order(user, &line, service).await,
    }
}

fn rejected(op: Operation, err: OrderError) -> PlatebookResponse {
    PlatebookResponse::rejected(reply::error(op, &err), err.code())
}

async fn handle_health(service: &OrderService) -> PlatebookResponse {
    let sqlite_ver = match service.backend_version().await {
        Ok(v) => v,
        Err(e) => return PlatebookResponse::err(format!("DB Health Check failed: {}", e)),
    };
    let active = match service.active_session().await {
        Ok(s) => s.map(|s| s.id),
        Err(e) => return PlatebookResponse::err(format!("Active session lookup failed: {}", e)),
    };
    PlatebookResponse::ok(
        "healthy",
        serde_json::json!({
            "sqlite": sqlite_ver,
            "active_session": active,
            "status": "healthy"
        }),
    )
}

async fn handle_open(service: &OrderService) -> PlatebookResponse {
    match service.open().await {
        Ok(opened) => PlatebookResponse::ok(
            reply::opened(&opened),
            serde_json::json!({
                "session_id": opened.id,
                "superseded": opened.superseded,
            }),
        ),
        Err(e) => rejected(Operation::Open, e),
    }
}

async fn handle_order(user: &str, text: &str, service: &OrderService) -> PlatebookResponse {
    match service.submit_order(user, text).await {
        Ok(line) => PlatebookResponse::ok(
            reply::order_saved(line.item_id),
            serde_json::json!({
                "session_id": line.session_id,
                "user": line.username,
                "item_id": line.item_id,
                "quantity": line.quantity,
            }),
        ),
        Err(e) => rejected(Operation::Order, e),
    }
}

async fn handle_close(service: &OrderService) -> PlatebookResponse {
    match service.close().await {
        Ok(closed) => PlatebookResponse::ok(
            reply::closed(&closed),
            serde_json::json!({
                "session_id": closed.id,
                "totals": closed.totals,
            }),
        ),
        Err(e) => rejected(Operation::Close, e),
    }
}

async fn handle_search(session_id: &str, service: &OrderService) -> PlatebookResponse {
    match service.search(session_id).await {
        Ok(totals) => PlatebookResponse::ok(
            reply::summary(session_id.trim(), &totals),
            serde_json::json!({
                "session_id": session_id.trim(),
                "totals": totals,
            }),
        ),
        Err(e) => rejected(Operation::Search, e),
    }
}

async fn handle_list(limit: Option<u32>, service: &OrderService) -> PlatebookResponse {
    match service.list_sessions(limit).await {
        Ok(sessions) => PlatebookResponse::ok(
            reply::session_list(&sessions),
            serde_json::json!({ "sessions": sessions }),
        ),
        Err(e) => rejected(Operation::List, e),
    }
}
