//! LRU Repo - named, disk-persisted LRU repositories
//!
//! Serves repositories over HTTP and flushes them all on shutdown.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lru_repo::api::create_router;
use lru_repo::{spawn_flush_task, AppState, Config};

/// Main entry point for the repository server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the repository registry
/// 4. Start background flush task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. On SIGINT/SIGTERM, stop serving and flush every repository
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lru_repo=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting LRU repository server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_dir={}, max_size={}, save_delay={}s, port={}, flush_interval={}s",
        config.cache_dir.display(),
        config.max_size,
        config.save_delay,
        config.server_port,
        config.flush_interval
    );

    let state = AppState::from_config(&config);
    let registry = state.registry.clone();

    let flush_handle = spawn_flush_task(registry.clone(), config.flush_interval);
    info!("Background flush task started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(flush_handle))
        .await
        .context("server error")?;

    // Exit hook: runs once, after the last request has been served
    let written = registry.write().await.shutdown();
    info!("Server shutdown complete, {} repositories flushed", written);
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the flush task and allows graceful shutdown.
async fn shutdown_signal(flush_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
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

    flush_handle.abort();
    warn!("Flush task aborted");
}
