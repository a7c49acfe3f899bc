//! navdb Server Binary
//!
//! Starts the TCP server for navdb.

use std::sync::Arc;

use clap::Parser;
use navdb::network::Server;
use navdb::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// navdb Server
#[derive(Parser, Debug)]
#[command(name = "navdb-server")]
#[command(about = "Navigation database server")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./navdb_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Number of worker threads
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Request queue capacity
    #[arg(short, long, default_value = "100")]
    queue_capacity: usize,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "64")]
    max_connections: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,navdb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("navdb server v{}", navdb::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .worker_count(args.workers)
        .queue_capacity(args.queue_capacity)
        .max_connections(args.max_connections)
        .build();

    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Engine initialized successfully");

    let server = match Server::bind(config, engine) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
