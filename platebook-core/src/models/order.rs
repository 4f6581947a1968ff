use serde::{Deserialize, Serialize};

/// Accumulated quantity of one plate requested by one user in one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderLine {
    pub session_id: String,
    pub username: String,
    pub item_id: i64,
    pub quantity: i64,
}

/// Per-plate sum across every user of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ItemTotal {
    pub item_id: i64,
    pub total_quantity: i64,
}
