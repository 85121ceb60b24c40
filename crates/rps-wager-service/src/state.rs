//! Application state management.

use crate::config::ServiceConfig;
use rps_wager_core::{BroadcastSink, House, SnapshotStore, WagerError};
use std::sync::Arc;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    house: House,
    events: BroadcastSink,
}

impl AppState {
    /// Create state around an existing house (for testing)
    pub fn new(house: House) -> Self {
        let events = BroadcastSink::new(EVENT_CHANNEL_CAPACITY);
        Self {
            house: house.with_sink(Arc::new(events.clone())),
            events,
        }
    }

    /// Build state from configuration, loading the snapshot if one is configured
    pub fn from_config(config: &ServiceConfig) -> Result<Self, WagerError> {
        let house = match &config.state_path {
            Some(path) => House::open(config.creator, &config.wager, SnapshotStore::new(path))?,
            None => {
                tracing::info!("WAGER_STATE_PATH not set, state will not survive restarts");
                House::new(config.creator, &config.wager)?
            }
        };
        Ok(Self::new(house))
    }

    pub fn house(&self) -> &House {
        &self.house
    }

    pub fn events(&self) -> &BroadcastSink {
        &self.events
    }
}
