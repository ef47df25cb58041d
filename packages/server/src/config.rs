//! Server configuration.

use std::{path::PathBuf, time::Duration};

use crate::error::ServerError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8189;
pub const DEFAULT_MAX_CLIENTS: usize = 40;
pub const DEFAULT_MIN_MESSAGE_INTERVAL: Duration = Duration::from_millis(900);
pub const DEFAULT_HISTORY_WINDOW: usize = 20;

/// Runtime settings of the chat server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host address of the chat listener
    pub host: String,
    /// Port of the chat listener (0 picks an ephemeral port)
    pub port: u16,
    /// Size of the session worker pool
    pub max_clients: usize,
    /// Minimum interval between two accepted public messages of one session
    pub min_message_interval: Duration,
    /// Number of history entries replayed to a newly authenticated session
    pub history_window: usize,
    /// Port of the status HTTP API; disabled when `None`
    pub http_port: Option<u16>,
    /// JSON file for user credentials; in-memory when `None`
    pub users_file: Option<PathBuf>,
    /// JSON Lines file for message history; in-memory when `None`
    pub history_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_clients: DEFAULT_MAX_CLIENTS,
            min_message_interval: DEFAULT_MIN_MESSAGE_INTERVAL,
            history_window: DEFAULT_HISTORY_WINDOW,
            http_port: None,
            users_file: None,
            history_file: None,
        }
    }
}

impl ServerConfig {
    /// Check settings that cannot be expressed through types
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.max_clients == 0 {
            return Err(ServerError::Config(
                "max_clients must be at least 1".to_string(),
            ));
        }
        if self.host.trim().is_empty() {
            return Err(ServerError::Config("host must not be empty".to_string()));
        }
        Ok(())
    }

    /// `host:port` of the chat listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `host:port` of the status HTTP API, if enabled
    pub fn http_bind_addr(&self) -> Option<String> {
        self.http_port.map(|port| format!("{}:{}", self.host, port))
    }
}
