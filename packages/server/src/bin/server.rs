//! Hiroma chat server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroma-server
//! cargo run --bin hiroma-server -- --host 0.0.0.0 --port 8189 --http-port 8190
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use hiroma_server::{build_app_state, config::ServerConfig, error::ServerError, ui::Server};
use hiroma_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroma-server")]
#[command(about = "TCP chat server with presence and history replay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number of the chat listener
    #[arg(short = 'p', long, default_value = "8189")]
    port: u16,

    /// Maximum number of concurrently served sessions; extra connections queue
    #[arg(long, default_value = "40")]
    max_clients: usize,

    /// Minimum interval between two public messages of one user (milliseconds)
    #[arg(long, default_value = "900")]
    min_interval_ms: u64,

    /// Number of recent messages replayed after login
    #[arg(long, default_value = "20")]
    history_window: usize,

    /// Port of the status HTTP API (disabled when omitted)
    #[arg(long)]
    http_port: Option<u16>,

    /// JSON file with registered users (in-memory when omitted)
    #[arg(long)]
    users_file: Option<PathBuf>,

    /// JSON Lines file with message history (in-memory when omitted)
    #[arg(long)]
    history_file: Option<PathBuf>,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            max_clients: args.max_clients,
            min_message_interval: Duration::from_millis(args.min_interval_ms),
            history_window: args.history_window,
            http_port: args.http_port,
            users_file: args.users_file,
            history_file: args.history_file,
        }
    }
}

async fn run(config: ServerConfig) -> Result<(), ServerError> {
    config.validate()?;
    let state = Arc::new(build_app_state(&config).await?);
    let server = Server::bind(&config, state).await?;
    server.run().await
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let config = ServerConfig::from(Args::parse());
    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
