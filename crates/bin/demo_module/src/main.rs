//! # demo_module: example peripheral module
//!
//! Serves a small temperature API and runs the registration agent next to it
//! so the gateway can route `/modules/{id}/proxy/**` here.
//!
//! The agent runs on its own task. Registration failures never stop the HTTP
//! server; on shutdown the agent is cancelled before the process exits.

mod api;
mod config;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use modhub_agent::{HttpGatewayClient, RegistrationAgent};

use crate::config::Settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .init();

    let client = HttpGatewayClient::new(
        &settings.agent.gateway_url,
        settings.agent.request_timeout(),
    )?;
    let agent = RegistrationAgent::new(settings.agent.clone(), client)?;
    tracing::info!(
        module_id = %agent.module_id(),
        gateway = %settings.agent.gateway_url,
        "starting registration agent"
    );
    let cancel = CancellationToken::new();
    let agent_task = agent.spawn(cancel.clone());

    let bind_addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(address = %bind_addr, "demo module listening");

    axum::serve(listener, api::router())
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;

    cancel.cancel();
    if let Err(err) = agent_task.await {
        tracing::warn!(%err, "registration agent task failed");
    }
    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
    cancel.cancel();
}
