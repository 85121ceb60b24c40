//! Service configuration from environment variables.

use rps_wager_core::{credits, Identity, WagerConfig, ESCROW_ACCOUNT};
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub port: u16,
    /// Snapshot file; state is in-memory only when unset
    pub state_path: Option<PathBuf>,
    /// Ledger creator; receives the initial mint and administers the airdrop pool
    pub creator: Identity,
    pub wager: WagerConfig,
}

impl ServiceConfig {
    /// Read `PORT`, `WAGER_STATE_PATH`, `WAGER_CREATOR_ID` and `WAGER_MIN_STAKE`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = match lookup("PORT") {
            Some(s) => s.parse().unwrap_or_else(|_| {
                tracing::warn!("Invalid PORT {:?}, using 3000", s);
                3000
            }),
            None => 3000,
        };

        let state_path = lookup("WAGER_STATE_PATH")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let creator = match lookup("WAGER_CREATOR_ID").map(|s| s.parse::<Identity>()) {
            Some(Ok(id)) if id == ESCROW_ACCOUNT => {
                let generated = Identity::new();
                tracing::warn!(
                    "WAGER_CREATOR_ID {} is the reserved escrow account, generated creator {}",
                    id,
                    generated
                );
                generated
            }
            Some(Ok(id)) => id,
            Some(Err(e)) => {
                let id = Identity::new();
                tracing::warn!("Invalid WAGER_CREATOR_ID ({}), generated creator {}", e, id);
                id
            }
            None => {
                let id = Identity::new();
                tracing::info!(
                    "WAGER_CREATOR_ID not set, generated creator {} (set it to keep the same creator)",
                    id
                );
                id
            }
        };

        let mut wager = WagerConfig::default();
        if let Some(s) = lookup("WAGER_MIN_STAKE") {
            match s.parse::<u64>() {
                Ok(n) => wager.min_stake = credits(n),
                Err(_) => tracing::warn!("Invalid WAGER_MIN_STAKE {:?}, keeping default", s),
            }
        }

        Self {
            port,
            state_path,
            creator,
            wager,
        }
    }
}
