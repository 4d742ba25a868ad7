//! # modhubd: modhub gateway daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (`modhub.toml`, env vars)
//! - Install the `tracing` subscriber
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the module registry and the proxy service, injecting the
//!   storage and forwarder adapters via port traits
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** gateway crate that depends on all adapter crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use modhub_adapter_http_axum::AppState;
use modhub_adapter_storage_sqlite_sqlx::SqliteModuleRepository;
use modhub_app::services::{ModuleRegistry, ProxyService};

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = modhub_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let store = Arc::new(SqliteModuleRepository::new(db.pool().clone()));

    // Services
    let registry = Arc::new(
        ModuleRegistry::new(store).with_liveness(config.proxy.liveness_policy()),
    );
    let forwarder = config.proxy.forwarder().build()?;
    let proxy = Arc::new(ProxyService::new(
        Arc::clone(&registry),
        forwarder,
        config.proxy.path_guard(),
    ));

    // HTTP
    let state = AppState::from_arcs(registry, proxy);
    let app = modhub_adapter_http_axum::router::build(state, &config.server.base_path);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        address = %bind_addr,
        base_path = %config.server.base_path,
        "modhubd listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("modhubd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
