//! RPS Wager Service
//!
//! HTTP surface over the credit ledger and round escrow. Callers identify
//! themselves with an `X-User-Id` header.
//!
//! Request bodies take a choice either as its wire number (1 = rock,
//! 2 = paper, 3 = scissors) or as its name. Rounds and events in responses
//! always carry the name, so a client may send back what it received.

pub mod config;
pub mod handlers;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use handlers::*;
pub use state::AppState;

/// Build the API router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Ledger
        .route("/api/ledger", get(ledger_summary))
        .route("/api/me", get(get_me))
        .route("/api/balances/:id", get(get_balance))
        .route("/api/transfer", post(transfer))
        // Airdrop
        .route("/api/airdrop/claim", post(claim_airdrop))
        .route("/api/admin/airdrop-pool", post(set_airdrop_pool))
        // Rounds
        .route("/api/rounds", post(initiate_round))
        .route("/api/rounds/open", get(list_open_rounds))
        .route("/api/rounds/:id", get(get_round))
        .route("/api/rounds/:id/accept", post(accept_round))
        .route("/api/rounds/:id/terminate", post(terminate_round))
        // Health
        .route("/api/health", get(health))
        .layer(cors)
        .with_state(state)
}
