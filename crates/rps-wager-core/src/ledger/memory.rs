//! In-memory credit ledger.

use super::traits::{CreditLedger, Transfer};
use crate::config::WagerConfig;
use crate::error::WagerError;
use crate::escrow::ensure_not_escrow;
use crate::protocol::{Amount, Identity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Map-backed ledger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryLedger {
    creator: Identity,
    total_supply: Amount,
    claim_amount: Amount,
    airdrop_pool: Amount,
    balances: BTreeMap<Identity, Amount>,
    claimed: BTreeSet<Identity>,
}

impl InMemoryLedger {
    /// Create a ledger, minting half of the supply to `creator` and reserving
    /// the remainder for the airdrop pool.
    ///
    /// The escrow account cannot be the creator.
    pub fn new(creator: Identity, config: &WagerConfig) -> Result<Self, WagerError> {
        ensure_not_escrow(&creator)?;
        let minted = config.total_supply / 2;
        let mut balances = BTreeMap::new();
        balances.insert(creator, minted);

        tracing::info!(
            "Ledger created: {} minted to {}, {} reserved for airdrop",
            minted,
            creator,
            config.total_supply - minted
        );

        Ok(Self {
            creator,
            total_supply: config.total_supply,
            claim_amount: config.claim_amount,
            airdrop_pool: config.total_supply - minted,
            balances,
            claimed: BTreeSet::new(),
        })
    }

    /// All non-empty accounts
    pub fn holders(&self) -> impl Iterator<Item = (&Identity, &Amount)> {
        self.balances.iter().filter(|(_, amount)| **amount > 0)
    }

    fn credit(&mut self, who: &Identity, amount: Amount) -> Result<(), WagerError> {
        let balance = self.balance_of(who);
        let credited = balance
            .checked_add(amount)
            .ok_or(WagerError::BalanceOverflow(*who))?;
        self.balances.insert(*who, credited);
        Ok(())
    }
}

impl CreditLedger for InMemoryLedger {
    fn creator(&self) -> Identity {
        self.creator
    }

    fn total_supply(&self) -> Amount {
        self.total_supply
    }

    fn claim_amount(&self) -> Amount {
        self.claim_amount
    }

    fn airdrop_pool(&self) -> Amount {
        self.airdrop_pool
    }

    fn circulating(&self) -> Amount {
        self.balances.values().sum()
    }

    fn balance_of(&self, who: &Identity) -> Amount {
        self.balances.get(who).copied().unwrap_or(0)
    }

    fn has_claimed(&self, who: &Identity) -> bool {
        self.claimed.contains(who)
    }

    fn transfer_batch(&mut self, transfers: &[Transfer]) -> Result<(), WagerError> {
        // Stage every touched balance first so a failing step leaves nothing applied
        let mut staged: HashMap<Identity, Amount> = HashMap::new();

        for t in transfers {
            let available = *staged
                .entry(t.from)
                .or_insert_with(|| self.balances.get(&t.from).copied().unwrap_or(0));
            if available < t.amount {
                return Err(WagerError::InsufficientBalance {
                    available,
                    required: t.amount,
                });
            }
            staged.insert(t.from, available - t.amount);

            let current = *staged
                .entry(t.to)
                .or_insert_with(|| self.balances.get(&t.to).copied().unwrap_or(0));
            let credited = current
                .checked_add(t.amount)
                .ok_or(WagerError::BalanceOverflow(t.to))?;
            staged.insert(t.to, credited);
        }

        for t in transfers {
            tracing::debug!("Transfer {} from {} to {}", t.amount, t.from, t.to);
        }
        self.balances.extend(staged);
        Ok(())
    }

    fn claim_airdrop(&mut self, caller: &Identity) -> Result<Amount, WagerError> {
        if self.claimed.contains(caller) {
            return Err(WagerError::AlreadyClaimed(*caller));
        }
        if *caller == self.creator {
            return Err(WagerError::NotEligible);
        }
        // A pool raised past the reserve must still never mint beyond the supply cap
        let headroom = self.total_supply.saturating_sub(self.circulating());
        if self.airdrop_pool < self.claim_amount || headroom < self.claim_amount {
            return Err(WagerError::PoolExhausted {
                remaining: self.airdrop_pool.min(headroom),
                required: self.claim_amount,
            });
        }

        self.credit(caller, self.claim_amount)?;
        self.airdrop_pool -= self.claim_amount;
        self.claimed.insert(*caller);

        tracing::info!(
            "Airdrop of {} claimed by {}, pool now {}",
            self.claim_amount,
            caller,
            self.airdrop_pool
        );
        Ok(self.claim_amount)
    }

    fn set_airdrop_pool(&mut self, caller: &Identity, amount: Amount) -> Result<(), WagerError> {
        if *caller != self.creator {
            return Err(WagerError::NotCreator);
        }
        tracing::info!("Airdrop pool changed from {} to {}", self.airdrop_pool, amount);
        self.airdrop_pool = amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::credits;

    fn setup() -> (InMemoryLedger, Identity) {
        let owner = Identity::new();
        (InMemoryLedger::new(owner, &WagerConfig::default()).unwrap(), owner)
    }

    #[test]
    fn test_creation_mints_half_to_creator() {
        let (ledger, owner) = setup();

        assert_eq!(ledger.creator(), owner);
        assert_eq!(ledger.balance_of(&owner), credits(5_000_000));
        assert_eq!(ledger.airdrop_pool(), credits(5_000_000));
        assert_eq!(ledger.circulating(), credits(5_000_000));
        assert_eq!(ledger.total_supply(), credits(10_000_000));
    }

    #[test]
    fn test_transfer_moves_balance() {
        let (mut ledger, owner) = setup();
        let alice = Identity::new();

        ledger.transfer(&owner, &alice, credits(100)).unwrap();

        assert_eq!(ledger.balance_of(&alice), credits(100));
        assert_eq!(ledger.balance_of(&owner), credits(4_999_900));
        assert_eq!(ledger.circulating(), credits(5_000_000));
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let (mut ledger, _) = setup();
        let alice = Identity::new();
        let bob = Identity::new();

        let result = ledger.transfer(&alice, &bob, 1);
        assert!(matches!(
            result,
            Err(WagerError::InsufficientBalance {
                available: 0,
                required: 1
            })
        ));
        assert_eq!(ledger.balance_of(&bob), 0);
    }

    #[test]
    fn test_zero_transfer_is_noop() {
        let (mut ledger, owner) = setup();
        let alice = Identity::new();
        let before = ledger.clone();

        ledger.transfer(&alice, &owner, 0).unwrap();

        assert_eq!(ledger.balance_of(&owner), before.balance_of(&owner));
        assert_eq!(ledger.circulating(), before.circulating());
    }

    #[test]
    fn test_self_transfer_keeps_balance() {
        let (mut ledger, owner) = setup();
        ledger.transfer(&owner, &owner, credits(1)).unwrap();
        assert_eq!(ledger.balance_of(&owner), credits(5_000_000));
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let (mut ledger, owner) = setup();
        let alice = Identity::new();
        let bob = Identity::new();
        ledger.transfer(&owner, &alice, credits(50)).unwrap();
        let before = ledger.clone();

        // Second step overdraws alice after the first one succeeded
        let result = ledger.transfer_batch(&[
            Transfer::new(alice, bob, credits(30)),
            Transfer::new(alice, bob, credits(30)),
        ]);

        assert!(matches!(
            result,
            Err(WagerError::InsufficientBalance { .. })
        ));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_batch_sees_earlier_steps() {
        let (mut ledger, owner) = setup();
        let alice = Identity::new();
        let bob = Identity::new();

        // alice can only pay bob with what she receives in the same batch
        ledger
            .transfer_batch(&[
                Transfer::new(owner, alice, credits(10)),
                Transfer::new(alice, bob, credits(10)),
            ])
            .unwrap();

        assert_eq!(ledger.balance_of(&alice), 0);
        assert_eq!(ledger.balance_of(&bob), credits(10));
    }

    #[test]
    fn test_claim_airdrop() {
        let (mut ledger, _) = setup();
        let alice = Identity::new();
        let pool = ledger.airdrop_pool();

        let claimed = ledger.claim_airdrop(&alice).unwrap();

        assert_eq!(claimed, credits(250));
        assert_eq!(ledger.balance_of(&alice), credits(250));
        assert_eq!(ledger.airdrop_pool(), pool - credits(250));
        assert!(ledger.has_claimed(&alice));
    }

    #[test]
    fn test_claim_airdrop_only_once() {
        let (mut ledger, _) = setup();
        let alice = Identity::new();
        ledger.claim_airdrop(&alice).unwrap();
        let before = ledger.clone();

        let result = ledger.claim_airdrop(&alice);

        assert!(matches!(result, Err(WagerError::AlreadyClaimed(id)) if id == alice));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_creator_cannot_claim() {
        let (mut ledger, owner) = setup();
        let result = ledger.claim_airdrop(&owner);
        assert!(matches!(result, Err(WagerError::NotEligible)));
        assert!(!ledger.has_claimed(&owner));
    }

    #[test]
    fn test_set_airdrop_pool() {
        let (mut ledger, owner) = setup();
        ledger.set_airdrop_pool(&owner, credits(250)).unwrap();
        assert_eq!(ledger.airdrop_pool(), credits(250));
    }

    #[test]
    fn test_set_airdrop_pool_creator_only() {
        let (mut ledger, _) = setup();
        let alice = Identity::new();
        let result = ledger.set_airdrop_pool(&alice, 0);
        assert!(matches!(result, Err(WagerError::NotCreator)));
        assert_eq!(ledger.airdrop_pool(), credits(5_000_000));
    }

    #[test]
    fn test_pool_exhausted() {
        let (mut ledger, owner) = setup();
        let alice = Identity::new();
        let bob = Identity::new();
        ledger.set_airdrop_pool(&owner, credits(250)).unwrap();

        ledger.claim_airdrop(&alice).unwrap();
        let result = ledger.claim_airdrop(&bob);

        assert!(matches!(result, Err(WagerError::PoolExhausted { .. })));
        assert_eq!(ledger.balance_of(&bob), 0);
        assert!(!ledger.has_claimed(&bob));
    }

    #[test]
    fn test_raised_pool_never_exceeds_supply() {
        let config = WagerConfig {
            total_supply: 1_000,
            claim_amount: 300,
            min_stake: 1,
        };
        let owner = Identity::new();
        let mut ledger = InMemoryLedger::new(owner, &config).unwrap();
        ledger.set_airdrop_pool(&owner, 10_000).unwrap();

        ledger.claim_airdrop(&Identity::new()).unwrap();
        let result = ledger.claim_airdrop(&Identity::new());

        assert!(matches!(result, Err(WagerError::PoolExhausted { .. })));
        assert!(ledger.circulating() <= ledger.total_supply());
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_state() {
        let (mut ledger, owner) = setup();
        let alice = Identity::new();
        ledger.claim_airdrop(&alice).unwrap();
        ledger.transfer(&owner, &alice, credits(5)).unwrap();

        let json = serde_json::to_string(&ledger).unwrap();
        let restored: InMemoryLedger = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, ledger);
        assert!(restored.has_claimed(&alice));
    }

    #[test]
    fn test_escrow_account_cannot_be_creator() {
        let result = InMemoryLedger::new(crate::escrow::ESCROW_ACCOUNT, &WagerConfig::default());
        assert!(matches!(result, Err(WagerError::ReservedIdentity(_))));
    }
}
