pub mod command;
pub mod config;
pub mod db;
pub mod error;
pub mod ipc;
pub mod models;
pub mod reply;
pub mod service;
pub mod store;

pub use config::PlatebookConfig;
pub use error::{OrderError, PlatebookError, StoreError};
pub use models::{ItemTotal, Session};
pub use service::OrderService;
pub use store::{OrderStore, SqliteOrderStore};
