use thiserror::Error;

/// Process-level failures while opening the order database.
#[derive(Error, Debug)]
pub enum PlatebookError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Failures raised by an `OrderStore`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("session id {0} already exists")]
    DuplicateKey(String),

    #[error("session {0} is not active")]
    SessionClosed(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Outcome taxonomy of the order service. Everything except `Store` is an
/// expected, user-facing condition.
#[derive(Error, Debug)]
pub enum OrderError {
    #[error("malformed order line")]
    Format,

    #[error("no active session")]
    NoActiveSession,

    #[error("order has no user name")]
    MissingUser,

    #[error("no session id provided")]
    MissingSessionId,

    #[error("session {0} not found")]
    SessionNotFound(String),

    #[error("could not allocate a unique session id (last tried {0})")]
    DuplicateKey(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OrderError {
    /// Stable machine-readable name, carried in IPC/HTTP error fields.
    pub fn code(&self) -> &'static str {
        match self {
            OrderError::Format => "format",
            OrderError::NoActiveSession => "no_active_session",
            OrderError::MissingUser => "missing_user",
            OrderError::MissingSessionId => "missing_session_id",
            OrderError::SessionNotFound(_) => "session_not_found",
            OrderError::DuplicateKey(_) => "duplicate_key",
            OrderError::Store(_) => "store",
        }
    }
}
