//! Server-level errors.

use thiserror::Error;

use crate::domain::StoreError;

/// Errors that stop the server
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Listener failure that is not a per-connection hiccup
    #[error("listener failed: {0}")]
    Accept(#[source] std::io::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to open store: {0}")]
    Store(#[from] StoreError),
}
