//! order-sync: catering order ingestion service
//!
//! Long-running service that:
//! - Receives marketplace webhooks and manual imports
//! - Polls the POS bulk export and parks changed orders for review
//! - Serves operator views (orders, reviews, freshness)

use order_sync::workers::PosPoller;
use order_sync::{AppState, Config, api, init_logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    init_logger(Some(&config.log_level), config.log_dir.as_deref());

    tracing::info!(
        "Starting order-sync (env: {}, tz: {})",
        config.environment,
        config.business_timezone
    );

    let http_port = config.http_port;
    let poll_interval = config.pos.as_ref().and_then(|p| p.poll_interval);

    // Fatal configuration problems surface here, before any order is processed
    let state = AppState::new(config).await?;
    let shutdown = state.shutdown.clone();

    let poller_handle = match (poll_interval, state.pos.is_some()) {
        (Some(interval), true) => {
            let poller = PosPoller::new(state.clone(), interval, shutdown.clone());
            Some(tokio::spawn(poller.run()))
        }
        _ => {
            tracing::info!("POS polling disabled");
            None
        }
    };

    let app = api::create_router(state);

    let http_addr = format!("0.0.0.0:{http_port}");
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("order-sync HTTP listening on {http_addr}");

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {e}");
            }
            tracing::info!("Shutdown signal received");
            signal.cancel();
        })
        .await?;

    shutdown.cancel();
    if let Some(handle) = poller_handle {
        handle.await?;
    }

    tracing::info!("order-sync stopped");
    Ok(())
}
