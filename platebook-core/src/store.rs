//! Persistent store for sessions and order lines.
//!
//! Every write runs inside a `sqlx::Transaction`. The transaction rolls back
//! when dropped without `commit()`, so an early `?` return never leaves a
//! partial write behind. Reads hold a pooled connection for the duration of
//! the query and hand it back on drop.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::StoreError;
use crate::models::{ItemTotal, Session};

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert `id` as the active session, deactivating whatever session was
    /// active before. Returns the ids that were deactivated.
    async fn create_session(
        &self,
        id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Vec<String>, StoreError>;

    /// The most recently created active session, if any.
    async fn get_active_session(&self) -> Result<Option<Session>, StoreError>;

    async fn session_exists(&self, id: &str) -> Result<bool, StoreError>;

    /// Add `delta` to the `(session_id, user, item_id)` line, creating it when
    /// missing. Returns the line's accumulated quantity.
    async fn upsert_order_line(
        &self,
        session_id: &str,
        user: &str,
        item_id: i64,
        delta: i64,
    ) -> Result<i64, StoreError>;

    /// Mark a session inactive. Closing a closed session is a no-op.
    async fn close_session(&self, id: &str) -> Result<(), StoreError>;

    async fn totals_for_session(&self, id: &str) -> Result<Vec<ItemTotal>, StoreError>;

    async fn list_recent_sessions(&self, limit: u32) -> Result<Vec<Session>, StoreError>;

    async fn backend_version(&self) -> Result<String, StoreError>;
}

pub struct SqliteOrderStore {
    pool: SqlitePool,
}

impl SqliteOrderStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn map_insert_error(err: sqlx::Error, id: &str) -> StoreError {
    match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            StoreError::DuplicateKey(id.to_string())
        }
        other => StoreError::Database(other),
    }
}

#[async_trait]
impl OrderStore for SqliteOrderStore {
    async fn create_session(
        &self,
        id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Vec<String>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let superseded: Vec<(String,)> =
            sqlx::query_as("UPDATE sessions SET active = 0 WHERE active = 1 RETURNING id")
                .fetch_all(&mut *tx)
                .await?;

        sqlx::query("INSERT INTO sessions (id, active, created_at) VALUES (?, 1, ?)")
            .bind(id)
            .bind(created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_insert_error(e, id))?;

        tx.commit().await?;

        Ok(superseded.into_iter().map(|(id,)| id).collect())
    }

    async fn get_active_session(&self) -> Result<Option<Session>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, active, created_at FROM sessions WHERE active = 1 ORDER BY rowid DESC LIMIT 1",
        )
        .fetch_optional(&mut *conn)
        .await?;
        Ok(session)
    }

    async fn session_exists(&self, id: &str) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    async fn upsert_order_line(
        &self,
        session_id: &str,
        user: &str,
        item_id: i64,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;

        // The SELECT only yields a row while the session is open, so a closed
        // session never gains lines.
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            INSERT INTO orders (session_id, username, item_id, quantity)
            SELECT id, ?, ?, ? FROM sessions WHERE id = ? AND active = 1
            ON CONFLICT (session_id, username, item_id)
            DO UPDATE SET quantity = orders.quantity + excluded.quantity
            RETURNING quantity
            "#,
        )
        .bind(user)
        .bind(item_id)
        .bind(delta)
        .bind(session_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((quantity,)) = row else {
            return Err(StoreError::SessionClosed(session_id.to_string()));
        };

        tx.commit().await?;
        Ok(quantity)
    }

    async fn close_session(&self, id: &str) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE sessions SET active = 0 WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn totals_for_session(&self, id: &str) -> Result<Vec<ItemTotal>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let totals = sqlx::query_as::<_, ItemTotal>(
            r#"
            SELECT item_id, SUM(quantity) AS total_quantity
            FROM orders
            WHERE session_id = ?
            GROUP BY item_id
            ORDER BY item_id
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(totals)
    }

    async fn list_recent_sessions(&self, limit: u32) -> Result<Vec<Session>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let sessions = sqlx::query_as::<_, Session>(
            "SELECT id, active, created_at FROM sessions ORDER BY rowid DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&mut *conn)
        .await?;
        Ok(sessions)
    }

    async fn backend_version(&self) -> Result<String, StoreError> {
        Ok(crate::db::health_check(&self.pool).await?)
    }
}
