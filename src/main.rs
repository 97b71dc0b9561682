use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trellis::api::{Dispatcher, RouteTable};
use trellis::app::{build_api, Services};
use trellis::config::load_config;
use trellis::http::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trellis=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("trellis v{} starting", env!("CARGO_PKG_VERSION"));

    // Configuration: optional TOML file plus environment overrides.
    let config_path = std::env::var("TRELLIS_CONFIG").ok().map(PathBuf::from);
    let config = load_config(config_path.as_deref())?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        prefix = %config.api.prefix,
        base_url = %config.api.base_url,
        "Configuration loaded"
    );

    // Collaborators are constructed once and threaded through dispatch.
    let services = Services::in_memory(&config);

    // Declaration tree → compiled, installed route table.
    let table = build_api(&config.api.prefix)
        .bind(RouteTable::new())
        .install()?;
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(table), services));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(&config, dispatcher);
    server.run(listener, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        return;
    }
    tracing::info!("Shutdown signal received");
}
