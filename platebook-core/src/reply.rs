//! User-facing reply text for every service outcome.

use crate::error::OrderError;
use crate::models::{ItemTotal, Session};
use crate::service::{ClosedSession, OpenedSession};

pub const WRONG_FORMAT: &str = "Wrong format! Use: 'plate_number quantity'.";
pub const NO_ACTIVE_SESSION_ORDER: &str = "No active session. Wait for a new session";
pub const NO_ACTIVE_SESSION_CLOSE: &str = "No Active session";
pub const NO_ORDERS: &str = "No orders found!";
pub const NO_SESSION_ID: &str = "No Session ID provided!";
pub const NO_USER: &str = "No user name provided!";
pub const NO_SESSIONS: &str = "No sessions saved";
pub const GENERIC_FAILURE: &str = "Something went wrong, please try again later.";
pub const USAGE: &str = "Commands:\n\
/open-session - start collecting orders\n\
/close-session - close the session and show the totals\n\
/search <session_id> - totals of any session\n\
/list-sessions - recent sessions\n\
Send 'plate_number quantity' to order.";

/// Which operation an error came from; the same condition reads differently
/// for different commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Open,
    Order,
    Close,
    Search,
    List,
}

pub fn opened(opened: &OpenedSession) -> String {
    let mut reply = format!("New session created! Session ID: {}", opened.id);
    for old in &opened.superseded {
        reply.push_str(&format!("\nSession {old} closed."));
    }
    reply
}

pub fn order_saved(item_id: i64) -> String {
    format!("Order saved for plate n. {item_id}")
}

pub fn summary(session_id: &str, totals: &[ItemTotal]) -> String {
    if totals.is_empty() {
        return NO_ORDERS.to_string();
    }
    let mut reply = format!("Orders for session {session_id}:");
    for total in totals {
        reply.push_str(&format!("\nplate n. {}: {}", total.item_id, total.total_quantity));
    }
    reply
}

pub fn closed(closed: &ClosedSession) -> String {
    summary(&closed.id, &closed.totals)
}

pub fn session_list(sessions: &[Session]) -> String {
    if sessions.is_empty() {
        return NO_SESSIONS.to_string();
    }
    sessions
        .iter()
        .map(|s| {
            format!(
                "{}-{}-{}",
                s.id,
                s.active,
                s.created_at.format("%Y-%m-%d %H:%M:%S")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn error(op: Operation, err: &OrderError) -> String {
    match err {
        OrderError::Format => WRONG_FORMAT.to_string(),
        OrderError::NoActiveSession if op == Operation::Close => {
            NO_ACTIVE_SESSION_CLOSE.to_string()
        }
        OrderError::NoActiveSession => NO_ACTIVE_SESSION_ORDER.to_string(),
        OrderError::MissingSessionId => NO_SESSION_ID.to_string(),
        OrderError::MissingUser => NO_USER.to_string(),
        OrderError::SessionNotFound(id) => format!("Session {id} not found!"),
        OrderError::DuplicateKey(_) | OrderError::Store(_) => {
            tracing::error!(operation = ?op, "Order operation failed: {}", err);
            GENERIC_FAILURE.to_string()
        }
    }
}
