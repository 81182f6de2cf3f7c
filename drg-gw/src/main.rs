//! drg-gw (Deep Research Gateway) - research stream relay service
//!
//! Exposes a long-running research job to the browser as a single live
//! SSE stream and proxies the report CRUD surface to the external report
//! store. The gateway is stateless per request: one backend channel per
//! stream, nothing persisted.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;

use drg_common::config::GatewayConfig;
use drg_gw::{build_router, AppState};

/// Command-line arguments for drg-gw
#[derive(Parser, Debug)]
#[command(name = "drg-gw")]
#[command(about = "Research stream relay gateway for DRG")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "DRG_CONFIG")]
    config: Option<PathBuf>,

    /// Host to listen on (overrides config file)
    #[arg(long, env = "DRG_GW_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "DRG_GW_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting DRG Gateway (drg-gw) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    // Resolve configuration: CLI > env > file > defaults
    let mut config = GatewayConfig::resolve(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.listen_host = host;
    }
    if let Some(port) = args.port {
        config.listen_port = port;
    }

    info!(mode = ?config.backend.mode, "Backend mode");
    info!("Report store: {}", config.reports.store_url);

    let addr = config.listen_addr();
    let state = AppState::new(config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("drg-gw listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

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
