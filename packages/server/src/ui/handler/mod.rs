//! Connection and request handlers.

pub mod http;
pub mod session;

pub use http::router;
pub use session::handle_connection;
