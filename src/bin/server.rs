//! Loopback Store Server Binary
//!
//! Runs an in-memory, protocol-compatible store for local development.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use tyrant_cache::network::Server;
use tyrant_cache::store::MemoryStore;
use tyrant_cache::ServerConfig;

/// tyrant-cache loopback store
#[derive(Parser, Debug)]
#[command(name = "tyrant-cache-server")]
#[command(about = "In-memory store speaking the Tokyo Tyrant binary protocol")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:1978")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Idle read timeout per connection in milliseconds (0 disables)
    #[arg(short, long, default_value = "30000")]
    read_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tyrant_cache=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("tyrant-cache loopback store v{}", tyrant_cache::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let config = ServerConfig::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.read_timeout_ms)
        .build();

    let server = match Server::bind(config, Arc::new(MemoryStore::new())) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
