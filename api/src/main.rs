//! Livescore API Server binary.
//!
//! Runs the polling loop next to the HTTP server and stops both on shutdown.

use std::sync::Arc;

use anyhow::Context;
use livescore_api::{shutdown_signal, AppState, Server, ServerConfig};
use livescore_tracker::{IntervalTicker, TrackerConfig};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,livescore_api=debug,livescore_tracker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let tracker_config = TrackerConfig::from_env().context("invalid tracker configuration")?;
    let server_config = ServerConfig::from_env().context("invalid server configuration")?;

    tracing::info!(
        poll_interval_ms = tracker_config.poll_interval_ms,
        external_api = %tracker_config.external_api_base_url,
        topic = %tracker_config.bus.topic,
        "Starting Livescore on {}:{}",
        server_config.host,
        server_config.port
    );

    let components = livescore_tracker::build(&tracker_config)
        .await
        .context("failed to build polling core")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = Arc::clone(&components.scheduler);
    let ticker = IntervalTicker::new(tracker_config.poll_interval());
    let polling = tokio::spawn(async move {
        scheduler.run(ticker, shutdown_rx).await;
    });

    let state = AppState::new(components.tracker, components.metrics);
    let served = Server::new(server_config, state)
        .run(shutdown_signal())
        .await;

    if shutdown_tx.send(true).is_err() {
        tracing::warn!("Polling loop already stopped");
    }
    polling.await.context("polling loop panicked")?;

    served.context("server failed")?;
    tracing::info!("Livescore stopped");
    Ok(())
}
