pub mod dispatcher;
pub mod http;
pub mod router;
pub mod server;
