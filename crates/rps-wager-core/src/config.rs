//! Ledger and escrow parameters.

use crate::protocol::Amount;
use serde::{Deserialize, Serialize};

/// Decimal places of one credit
pub const DECIMALS: u32 = 18;

/// Smallest units per credit
pub const UNIT: Amount = 10u128.pow(DECIMALS);

/// Convert whole credits to the smallest unit
pub const fn credits(n: u64) -> Amount {
    n as Amount * UNIT
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WagerConfig {
    /// Fixed supply; half is minted to the creator, the rest funds the airdrop pool
    pub total_supply: Amount,
    /// Credited once per identity by a successful airdrop claim
    pub claim_amount: Amount,
    pub min_stake: Amount,
}

impl Default for WagerConfig {
    fn default() -> Self {
        Self {
            total_supply: credits(10_000_000),
            claim_amount: credits(250),
            min_stake: credits(10),
        }
    }
}
