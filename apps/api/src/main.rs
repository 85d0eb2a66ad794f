//! # EventHub API
//!
//! HTTP server for event ticketing.
//!
//! ## Usage
//! ```bash
//! # Serve on HTTP_PORT (default 8080)
//! cargo run -p eventhub-api
//!
//! # Print an access token for an existing account (development)
//! cargo run -p eventhub-api -- token admin@eventhub.dev
//! ```

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use eventhub_api::services::UserService;
use eventhub_api::tasks::spawn_expiry_sweep;
use eventhub_api::{build_router, ApiConfig, AppState, MockPaymentGateway};
use eventhub_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = ApiConfig::load()?;
    info!(
        port = config.http_port,
        database = %config.database_path,
        "Configuration loaded"
    );

    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.db_max_connections),
    )
    .await?;

    // Real card processing is not wired up; the mock approves everything
    let state = Arc::new(AppState::new(db, config, MockPaymentGateway::shared()));

    let args: Vec<String> = env::args().skip(1).collect();
    if let [command, email] = args.as_slice() {
        if command == "token" {
            let token = UserService::new(state.clone())
                .issue_token(email)
                .await
                .map_err(|e| format!("{:?}: {}", e.code, e.message))?;
            println!("{token}");
            return Ok(());
        }
    }

    let sweep = spawn_expiry_sweep(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.http_port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "EventHub API listening");

    axum::serve(listener, build_router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweep.shutdown().await;
    state.db.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
