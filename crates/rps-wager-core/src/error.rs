//! Error types for ledger and escrow operations.

use crate::protocol::{Identity, RoundId};
use thiserror::Error;

/// Errors from wager operations.
///
/// Every variant aborts the operation before any state is touched.
#[derive(Debug, Error)]
pub enum WagerError {
    #[error("Invalid choice: {0} (expected 1 = rock, 2 = paper, 3 = scissors, or the name)")]
    InvalidChoice(String),

    #[error("Stake {stake} is below the minimum stake {minimum}")]
    StakeTooLow { stake: u128, minimum: u128 },

    #[error("Insufficient balance: {available} available, {required} required")]
    InsufficientBalance { available: u128, required: u128 },

    #[error("Round not found: {0}")]
    RoundNotFound(RoundId),

    #[error("Round {0} is already settled")]
    RoundAlreadySettled(RoundId),

    #[error("Only the initiator may terminate round {0}")]
    NotInitiator(RoundId),

    #[error("Airdrop already claimed by {0}")]
    AlreadyClaimed(Identity),

    #[error("The ledger creator cannot claim the airdrop")]
    NotEligible,

    #[error("Airdrop pool exhausted: {remaining} remaining, {required} required")]
    PoolExhausted { remaining: u128, required: u128 },

    #[error("Only the ledger creator may change the airdrop pool")]
    NotCreator,

    #[error("Identity {0} is reserved for the escrow account")]
    ReservedIdentity(Identity),

    #[error("Balance overflow on {0}")]
    BalanceOverflow(Identity),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl WagerError {
    /// Stable name of the error kind, used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            WagerError::InvalidChoice(_) => "InvalidChoice",
            WagerError::StakeTooLow { .. } => "StakeTooLow",
            WagerError::InsufficientBalance { .. } => "InsufficientBalance",
            WagerError::RoundNotFound(_) => "RoundNotFound",
            WagerError::RoundAlreadySettled(_) => "RoundAlreadySettled",
            WagerError::NotInitiator(_) => "NotInitiator",
            WagerError::AlreadyClaimed(_) => "AlreadyClaimed",
            WagerError::NotEligible => "NotEligible",
            WagerError::PoolExhausted { .. } => "PoolExhausted",
            WagerError::NotCreator => "NotCreator",
            WagerError::ReservedIdentity(_) => "ReservedIdentity",
            WagerError::BalanceOverflow(_) => "BalanceOverflow",
            WagerError::Storage(_) => "Storage",
        }
    }
}

/// Errors from the snapshot store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_names() {
        assert_eq!(WagerError::InvalidChoice("4".to_string()).kind(), "InvalidChoice");
        assert_eq!(WagerError::RoundNotFound(RoundId(7)).kind(), "RoundNotFound");
        assert_eq!(WagerError::NotEligible.kind(), "NotEligible");
    }

    #[test]
    fn test_error_messages() {
        let err = WagerError::StakeTooLow {
            stake: 9,
            minimum: 10,
        };
        assert_eq!(err.to_string(), "Stake 9 is below the minimum stake 10");

        let err = WagerError::RoundAlreadySettled(RoundId(3));
        assert_eq!(err.to_string(), "Round 3 is already settled");
    }
}
