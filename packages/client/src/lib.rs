//! Terminal client for the Hiroma chat server.

pub mod command;
pub mod error;
pub mod formatter;
pub mod session;
pub mod ui;

pub use session::run_client_session;
