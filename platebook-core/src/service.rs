//! Order service: the session state machine on top of an `OrderStore`.
//!
//! There is one "current session" slot, held in the store as the single row
//! with `active = 1`. `open()` fills it (closing any previous occupant),
//! `close()` empties it, and order submissions are only accepted while it is
//! filled.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::config::OrdersConfig;
use crate::error::{OrderError, StoreError};
use crate::models::{ItemTotal, OrderLine, Session};
use crate::store::OrderStore;

type IdGenerator = Box<dyn Fn() -> String + Send + Sync>;

/// Result of `open()`.
#[derive(Debug, Clone, Serialize)]
pub struct OpenedSession {
    pub id: String,
    /// Sessions that were still active and got closed by this open.
    pub superseded: Vec<String>,
}

/// Result of `close()`.
#[derive(Debug, Clone, Serialize)]
pub struct ClosedSession {
    pub id: String,
    pub totals: Vec<ItemTotal>,
}

pub struct OrderService {
    store: Arc<dyn OrderStore>,
    config: OrdersConfig,
    next_id: IdGenerator,
}

/// Eight hex characters from a v4 UUID: short enough to type in a chat
/// `/search`, with 2^32 possible values.
pub fn generate_session_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    hex[..8].to_string()
}

/// Parse `"<item_id> <quantity>"`: exactly two whitespace-separated
/// non-negative integers.
pub fn parse_order_line(text: &str) -> Result<(i64, i64), OrderError> {
    let mut tokens = text.split_whitespace();
    let (Some(item), Some(quantity), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(OrderError::Format);
    };
    Ok((parse_non_negative(item)?, parse_non_negative(quantity)?))
}

fn parse_non_negative(token: &str) -> Result<i64, OrderError> {
    match token.parse::<i64>() {
        Ok(n) if n >= 0 => Ok(n),
        _ => Err(OrderError::Format),
    }
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>, config: OrdersConfig) -> Self {
        Self {
            store,
            config,
            next_id: Box::new(generate_session_id),
        }
    }

    /// Replace the session id source. Tests use this to force collisions.
    pub fn with_id_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.next_id = Box::new(generator);
        self
    }

    pub async fn open(&self) -> Result<OpenedSession, OrderError> {
        let attempts = self.config.session_id_attempts.max(1);
        let mut last_id = String::new();

        for attempt in 1..=attempts {
            let id = (self.next_id)();
            match self.store.create_session(&id, Utc::now()).await {
                Ok(superseded) => {
                    for old in &superseded {
                        tracing::info!(session_id = %old, "Session closed by new session");
                    }
                    tracing::info!(session_id = %id, "Session opened");
                    return Ok(OpenedSession { id, superseded });
                }
                Err(StoreError::DuplicateKey(_)) => {
                    tracing::warn!(session_id = %id, attempt, "Session id collision, retrying");
                    last_id = id;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(OrderError::DuplicateKey(last_id))
    }

    pub async fn submit_order(&self, user: &str, text: &str) -> Result<OrderLine, OrderError> {
        let user = user.trim();
        if user.is_empty() {
            return Err(OrderError::MissingUser);
        }
        let (item_id, quantity) = parse_order_line(text).inspect_err(|_| {
            tracing::debug!(user, text, "Rejected malformed order line");
        })?;

        let session = self
            .store
            .get_active_session()
            .await?
            .ok_or(OrderError::NoActiveSession)?;

        let total = self
            .store
            .upsert_order_line(&session.id, user, item_id, quantity)
            .await
            .map_err(|e| match e {
                StoreError::SessionClosed(_) => OrderError::NoActiveSession,
                other => OrderError::Store(other),
            })?;

        tracing::info!(
            session_id = %session.id,
            user,
            item_id,
            quantity,
            total,
            "Order saved"
        );

        Ok(OrderLine {
            session_id: session.id,
            username: user.to_string(),
            item_id,
            quantity: total,
        })
    }

    pub async fn close(&self) -> Result<ClosedSession, OrderError> {
        let session = self
            .store
            .get_active_session()
            .await?
            .ok_or(OrderError::NoActiveSession)?;

        self.store.close_session(&session.id).await?;
        let totals = self.store.totals_for_session(&session.id).await?;

        tracing::info!(session_id = %session.id, plates = totals.len(), "Session closed");
        Ok(ClosedSession {
            id: session.id,
            totals,
        })
    }

    pub async fn search(&self, session_id: &str) -> Result<Vec<ItemTotal>, OrderError> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(OrderError::MissingSessionId);
        }
        if !self.store.session_exists(session_id).await? {
            return Err(OrderError::SessionNotFound(session_id.to_string()));
        }
        Ok(self.store.totals_for_session(session_id).await?)
    }

    /// Most recent sessions first; `None` uses the configured default.
    pub async fn list_sessions(&self, limit: Option<u32>) -> Result<Vec<Session>, OrderError> {
        let limit = limit.unwrap_or(self.config.list_limit);
        Ok(self.store.list_recent_sessions(limit).await?)
    }

    pub async fn active_session(&self) -> Result<Option<Session>, OrderError> {
        Ok(self.store.get_active_session().await?)
    }

    pub async fn backend_version(&self) -> Result<String, OrderError> {
        Ok(self.store.backend_version().await?)
    }
}
