//! Mini Cache - An in-memory key-value cache server
//!
//! Provides Redis-like functionality with TTL expiration, LRU eviction and
//! snapshot persistence over a line-oriented TCP protocol.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_cache::{
    serve, spawn_snapshot_task, CacheStore, CommandParser, Config, SnapshotStore, TtlSweeper,
};

/// Main entry point for the Mini Cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Create cache store and restore the last snapshot
/// 4. Start background TTL sweeper and periodic snapshot task
/// 5. Accept TCP clients on the configured address
/// 6. On SIGINT/SIGTERM stop background tasks and save a final snapshot
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mini Cache Server");

    let config = Config::from_env();
    config.validate().context("invalid configuration")?;
    info!(
        capacity = config.capacity,
        sweep_interval_ms = config.sweep_interval_ms,
        snapshot_path = %config.snapshot_path.display(),
        snapshot_interval_secs = config.snapshot_interval_secs,
        port = config.server_port,
        "Configuration loaded"
    );

    let store = Arc::new(CacheStore::new(config.capacity)?);
    let snapshots = Arc::new(SnapshotStore::new(
        Arc::clone(&store),
        config.snapshot_path.clone(),
    ));
    let outcome = snapshots.load();
    info!(?outcome, keys = store.len(), "Cache store initialized");

    let mut sweeper = TtlSweeper::new(Arc::clone(&store), config.sweep_interval())?;
    sweeper.start();

    let snapshot_handle = config
        .snapshot_interval()
        .map(|interval| spawn_snapshot_task(Arc::clone(&snapshots), interval));

    let parser = Arc::new(CommandParser::new(Arc::clone(&store)).with_snapshots(Arc::clone(&snapshots)));

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    serve(listener, parser, shutdown_signal()).await;

    sweeper.stop();
    if let Some(handle) = snapshot_handle {
        handle.abort();
    }
    warn!("Background tasks stopped");

    let final_save = tokio::task::spawn_blocking(move || snapshots.save()).await?;
    info!(saved = final_save, "Server shutdown complete");

    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
