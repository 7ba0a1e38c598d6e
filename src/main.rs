use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mock_worker::config::{Cli, WorkerConfig};
use mock_worker::engine::TaskEngine;
use mock_worker::registry::TaskRegistry;
use mock_worker::scenario::simulated::SimulatedExecutor;
use mock_worker::server::{self, AppState};
use mock_worker::webhook::WebhookDispatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = WorkerConfig::from(Cli::parse());
    if config.internal_auth_token.is_empty() {
        warn!("INTERNAL_AUTH_TOKEN is not set, webhooks will carry an empty internal auth header");
    }

    // Wire up the engine
    let registry = Arc::new(TaskRegistry::new());
    let executor = Arc::new(SimulatedExecutor::new(config.timings));
    let webhook = WebhookDispatcher::new(&config.internal_auth_token)
        .context("failed to build webhook client, check INTERNAL_AUTH_TOKEN")?;
    let engine = Arc::new(TaskEngine::new(
        registry,
        executor,
        webhook,
        config.engine_config(),
    ));

    // Ctrl+C and POST /admin/shutdown both end up here
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("interrupt received");
                    shutdown.cancel();
                }
                Err(e) => warn!(error = %e, "cannot listen for ctrl-c"),
            }
        }
    });

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!(
        addr = %listener.local_addr()?,
        capacity = config.capacity,
        timeout_secs = config.timings.timeout_duration.as_secs(),
        "mock worker listening"
    );

    server::serve(listener, AppState::new(engine, shutdown))
        .await
        .context("server error")?;

    info!("mock worker stopped");
    Ok(())
}
