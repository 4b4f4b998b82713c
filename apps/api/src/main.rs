//! # Arnica API Server
//!
//! REST server for the Arnica online pharmacy.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Arnica API Server                              │
//! │                                                                         │
//! │  Storefront / Back office ───► HTTP (8080) ───► Routes ───► SQLite     │
//! │                                                    │                    │
//! │                                                    ▼                    │
//! │                                              arnica-core                │
//! │                                           (pure decisions)              │
//! │                                                                         │
//! │  Background: expiry sweep on a cron schedule                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use arnica_api::config::ApiConfig;
use arnica_api::{app, jobs, AppState};
use arnica_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Arnica API server");

    let config = ApiConfig::load()?;
    info!(
        port = config.http_port,
        database = %config.database_path,
        "Configuration loaded"
    );

    if let Some(parent) = Path::new(&config.database_path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    info!("Database ready, migrations applied");

    let state = Arc::new(AppState { db, config });

    // The handle must outlive the server for the sweep to keep firing.
    let _scheduler = jobs::start(state.clone()).await?;

    let listener = TcpListener::bind(("0.0.0.0", state.config.http_port)).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
