//! RPS Wager Service
//!
//! Two-party rock-paper-scissors wagers over a fixed-supply credit ledger.

use rps_wager_service::{app, config::ServiceConfig, AppState};
use std::net::SocketAddr;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env();
    let state = AppState::from_config(&config)?;

    let summary = state.house().summary();
    tracing::info!(
        "Ledger creator {}: supply {}, airdrop pool {}, min stake {}",
        summary.creator,
        summary.total_supply,
        summary.airdrop_pool,
        summary.min_stake
    );

    // Log round notifications for external observers tailing the service output
    let mut events = state.events().subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => tracing::info!(target: "rps_wager::events", "{}", json),
                    Err(e) => tracing::warn!("Failed to encode event: {}", e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event log lagged, skipped {} events", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Wager service starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}
