//! Viewer service (rodomap-ui) - Main entry point
//!
//! Loads the hazard and occurrence layers from a local data folder and
//! serves the clustering/ranking/scoring engine's outputs to the browser
//! collaborators.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rodomap_ui::{api, config, loader, state::SharedState};

/// Command-line arguments for rodomap-ui
#[derive(Parser, Debug)]
#[command(name = "rodomap-ui")]
#[command(about = "Road-occurrence map viewer service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5850", env = "RODOMAP_PORT")]
    port: u16,

    /// Folder containing the GeoJSON layer files
    #[arg(short, long)]
    data_folder: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rodomap_ui=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();
    let data_folder = config::resolve_data_folder(args.data_folder.as_deref());

    info!("Starting rodomap viewer on port {}", args.port);
    info!("Data folder: {}", data_folder.display());

    // Initial data load; failures degrade to an empty dataset
    let loaded = loader::load_all(&data_folder).await;
    let state = Arc::new(SharedState::new(loaded));

    // Build the application router
    let app_state = api::AppState {
        state,
        data_folder,
        port: args.port,
    };
    let app = api::create_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
