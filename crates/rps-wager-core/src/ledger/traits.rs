//! Credit ledger trait definition.

use crate::error::WagerError;
use crate::protocol::{Amount, Identity};
use serde::{Deserialize, Serialize};

/// A single balance movement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: Identity,
    pub to: Identity,
    pub amount: Amount,
}

impl Transfer {
    pub fn new(from: Identity, to: Identity, amount: Amount) -> Self {
        Self { from, to, amount }
    }
}

/// Trait for credit ledger operations
///
/// This trait owns every balance in the system. Implementations can be:
/// - InMemoryLedger for tests and the single-process service
/// - A transactional store behind the same interface
///
/// Mutations either apply completely or return an error with no effect.
pub trait CreditLedger: Send + Sync {
    /// Identity that received the initial mint; excluded from the airdrop
    fn creator(&self) -> Identity;

    /// Fixed supply cap
    fn total_supply(&self) -> Amount;

    /// Amount credited by one airdrop claim
    fn claim_amount(&self) -> Amount;

    /// Remaining claimable airdrop amount
    fn airdrop_pool(&self) -> Amount;

    /// Sum of all balances, escrow included
    fn circulating(&self) -> Amount;

    fn balance_of(&self, who: &Identity) -> Amount;

    fn has_claimed(&self, who: &Identity) -> bool;

    /// Apply transfers in order, all or nothing
    fn transfer_batch(&mut self, transfers: &[Transfer]) -> Result<(), WagerError>;

    fn transfer(&mut self, from: &Identity, to: &Identity, amount: Amount) -> Result<(), WagerError> {
        self.transfer_batch(&[Transfer::new(*from, *to, amount)])
    }

    /// Credit the one-time airdrop to `caller`, returning the amount credited
    fn claim_airdrop(&mut self, caller: &Identity) -> Result<Amount, WagerError>;

    /// Replace the airdrop pool; creator only
    fn set_airdrop_pool(&mut self, caller: &Identity, amount: Amount) -> Result<(), WagerError>;
}
