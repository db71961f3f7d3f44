//! dynosql server binary.
//!
//! Serves an in-memory store over a Unix domain socket.

use std::path::PathBuf;

use clap::Parser;
use dynosql_core::store::MemoryStore;
use dynosql_server::{DynosqlServer, default_socket_path};
use tracing::info;

/// dynosql server: a local tagged-value store reachable over a Unix socket.
#[derive(Parser, Debug)]
#[command(name = "dynosql-server", version)]
struct Cli {
    /// Unix socket path to listen on (default: ~/.local/share/dynosql/server.sock).
    #[arg(short, long)]
    socket: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let socket_path = cli.socket.unwrap_or_else(default_socket_path);

    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    info!(socket = %socket_path.display(), "starting");

    let server = DynosqlServer::new(MemoryStore::new(), socket_path);
    server.run().await?;

    Ok(())
}
