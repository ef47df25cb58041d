//! Terminal chat client for the Hiroma chat server.
//!
//! Reads lines from stdin: `/reg <login> <password>`, `/auth <login> <password>`,
//! `/logout`, anything else is sent as a public message. Exits after logout or
//! when the connection is lost.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroma-client
//! cargo run --bin hiroma-client -- --host 127.0.0.1 --port 8189
//! ```

use clap::Parser;
use hiroma_client::run_client_session;
use hiroma_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroma-client")]
#[command(about = "Terminal client for the Hiroma chat server", long_about = None)]
struct Args {
    /// Server host
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short = 'p', long, default_value = "8189")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    if let Err(e) = run_client_session(&addr).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
