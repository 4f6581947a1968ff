use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlatebookRequest {
    Ping,
    Health,
    /// Raw chat message; slash commands and order lines are told apart here.
    Message {
        user: String,
        text: String,
    },
    OpenSession,
    CloseSession,
    SubmitOrder {
        user: String,
        text: String,
    },
    Search {
        session_id: Option<String>,
    },
    ListSessions {
        limit: Option<u32>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PlatebookResponse {
    pub status: String,
    /// Text to relay back to the chat.
    pub reply: Option<String>,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub version: String,
}

impl PlatebookResponse {
    pub fn ok(reply: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            status: "ok".to_string(),
            reply: Some(reply.into()),
            data: Some(data),
            error: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// A rejected request. `reply` is still set so the chat bridge can relay it.
    pub fn rejected(reply: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            reply: Some(reply.into()),
            data: None,
            error: Some(error.into()),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            reply: None,
            data: None,
            error: Some(msg.into()),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn pong() -> Self {
        Self::ok("pong", serde_json::json!({"pong": true}))
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
