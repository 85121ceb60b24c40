//! RPS Wager Core Library
//!
//! This crate provides the credit ledger, the rock-paper-scissors outcome
//! resolver and the round escrow state machine that moves staked credits
//! between two participants.

pub mod config;
pub mod error;
pub mod escrow;
pub mod games;
pub mod house;
pub mod ledger;
pub mod protocol;
pub mod store;

pub use config::{credits, WagerConfig, DECIMALS, UNIT};
pub use error::{StoreError, WagerError};
pub use escrow::{RoundEscrow, ESCROW_ACCOUNT};
pub use games::{resolve, Choice, Outcome};
pub use house::{House, LedgerSummary};
pub use ledger::{CreditLedger, InMemoryLedger, Transfer};
pub use protocol::{
    amount_serde, Amount, BroadcastSink, EventSink, Identity, Round, RoundEvent, RoundId,
    RoundStatus,
};
pub use store::{Snapshot, SnapshotStore};
