//! Startup wiring and the HTTP listener.

use crate::config::Config;
use anyhow::Context;
use axum::Router;
use items_postgres::PostgresItemGateway;
use items_web::{AppState, build_router};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Connect to the item store, apply migrations and build the service context.
///
/// # Errors
///
/// Fails if the database is unreachable or a migration fails.
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    info!("Connecting to item store...");
    let gateway = PostgresItemGateway::connect(&config.database)
        .await
        .context("Failed to connect to the item store")?;

    gateway
        .migrate()
        .await
        .context("Failed to apply item store migrations")?;
    info!("Item store ready");

    Ok(AppState::new(Arc::new(gateway)).with_persistence_timeout(config.persistence_timeout()))
}

/// Load everything and serve until a shutdown signal arrives.
///
/// # Errors
///
/// Fails on any startup error or if the listener cannot be bound.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = build_state(&config).await?;
    let app = build_router(state);

    let address = config.server.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!(address = %address, environment = %config.environment, "Items service listening");

    serve(listener, app, config.shutdown_timeout()).await
}

/// Serve `app` until Ctrl+C or SIGTERM.
///
/// In-flight requests get `shutdown_timeout` to finish; connections still
/// open after that are dropped.
///
/// # Errors
///
/// Fails if the server itself errors.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown_timeout: Duration,
) -> anyhow::Result<()> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = tx.send(true);
    });

    let mut graceful = rx.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = graceful.wait_for(|stopping| *stopping).await;
        })
        .into_future();

    let mut deadline = rx;
    let deadline = async move {
        let _ = deadline.wait_for(|stopping| *stopping).await;
        tokio::time::sleep(shutdown_timeout).await;
    };

    tokio::select! {
        result = server => result.context("HTTP server failed")?,
        () = deadline => {
            warn!(?shutdown_timeout, "Graceful shutdown timed out, dropping open connections");
        }
    }

    info!("Items service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
