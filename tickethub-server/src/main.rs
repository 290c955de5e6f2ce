//! TicketHub Server
//!
//! Accepts ticket purchases over HTTP and hands each one to a durable queue
//! for asynchronous fulfillment.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::ConfigLoader;
use server::{build_router, run_server};
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tickethub_core::queue::{AzureQueueClient, QueueGateway};
use tickethub_core::submission::SubmissionService;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// TicketHub - ticket purchase intake API
#[derive(Parser, Debug)]
#[command(name = "tickethub-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to an optional TOML configuration file
    #[arg(short, long, env = "TICKETHUB_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting tickethub-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = ConfigLoader::new(args.config.as_deref(), args.listen);
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!(queue = ?loaded_config.queue, "Configuration loaded");

    // Create the process-wide queue client
    let queue_client = AzureQueueClient::from_connection_string(
        loaded_config.queue.connection_string(),
        loaded_config.queue.name.clone(),
    )
    .map_err(|e| {
        tracing::error!(error = %e, "Error initializing queue client");
        e
    })?;
    tracing::info!(queue = %loaded_config.queue.name, "Queue client initialized successfully");

    // Early check only; every submission ensures the queue again.
    if let Err(e) = queue_client.ensure_queue().await {
        tracing::warn!(error = %e, "Queue is not reachable yet, continuing");
    }

    // Create application state
    let submission = SubmissionService::new(Arc::new(queue_client), loaded_config.queue.timeout);
    let state = AppState::new(submission);

    // Build the router
    let router = build_router(state);

    // Run the server
    let listen_addr = loaded_config.server.listen;
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Filter used when `RUST_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "info";

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
