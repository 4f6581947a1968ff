pub mod order;
pub mod session;

pub use order::{ItemTotal, OrderLine};
pub use session::Session;
