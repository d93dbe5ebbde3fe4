//! Todo Lambda - local runtime host
//!
//! Serves the todo handler export table over HTTP the way a function
//! gateway would: every request to `/<endpoint>` is converted to a transport
//! event and handed to the `"<endpoint>Handler"` export.
//!
//! # Service Topology
//!
//! - `/health` - Health check endpoint
//! - `/routes` - Registered handlers
//! - `/create`, `/get`, `/delete` - Todo endpoints

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapter;
mod config;
mod server;

use todo_api::InMemoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first: the log level comes from it
    let config = config::Config::load()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                let level = &config.log_level;
                format!("todo_lambda={level},todo_api={level},lambda_decorator={level},tower_http=debug").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!(
        service = %config.service_name,
        version = %config.service_version,
        "Starting Todo Lambda runtime host"
    );

    config.validate_for_production()?;
    info!(
        port = config.port,
        platform_env = config.platform_env.as_str(),
        stage = %config.stage,
        table = %config.table_name,
        "Configuration loaded"
    );

    let store = Arc::new(InMemoryStore::new(config.table_name.clone()));
    let exports = todo_api::exports(store).context("Failed to build handler exports")?;
    info!(handlers = exports.len(), "Handler exports ready");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = server::router(server::AppState::new(exports, config));

    info!(address = %addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
