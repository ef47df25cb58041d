//! TCP chat server and status HTTP API.

mod handler;
mod server;
mod signal;
pub mod state;

pub use handler::{handle_connection, router};
pub use server::Server;
pub use signal::shutdown_signal;
