//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Could not reach the server
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The server went away before logout
    #[error("connection lost")]
    ConnectionLost,
}

/// Input line that is not a valid command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("usage: {0} <login> <password>")]
    MissingCredentials(&'static str),

    #[error("unknown command '{0}' (try /reg, /auth or /logout)")]
    Unknown(String),
}
