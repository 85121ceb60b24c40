//! Shared, serialized access to the ledger and the round escrow.

use crate::config::WagerConfig;
use crate::error::WagerError;
use crate::escrow::{ensure_not_escrow, RoundEscrow, ESCROW_ACCOUNT};
use crate::games::Choice;
use crate::ledger::{CreditLedger, InMemoryLedger};
use crate::protocol::{amount_serde, Amount, EventSink, Identity, Round, RoundEvent, RoundId};
use crate::store::SnapshotStore;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Ledger-wide figures
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub creator: Identity,
    #[serde(with = "amount_serde")]
    pub total_supply: Amount,
    #[serde(with = "amount_serde")]
    pub circulating: Amount,
    #[serde(with = "amount_serde")]
    pub airdrop_pool: Amount,
    #[serde(with = "amount_serde")]
    pub claim_amount: Amount,
    #[serde(with = "amount_serde")]
    pub escrow_balance: Amount,
    #[serde(with = "amount_serde")]
    pub min_stake: Amount,
    pub open_rounds: usize,
}

/// The ledger and escrow behind one lock.
///
/// Every mutating call runs as a single transaction: it either applies fully
/// (and is persisted, when a store is configured) or fails with no effect.
#[derive(Clone)]
pub struct House {
    inner: Arc<Mutex<HouseInner>>,
    sink: Option<Arc<dyn EventSink>>,
    store: Option<Arc<SnapshotStore>>,
}

#[derive(Clone)]
struct HouseInner {
    ledger: InMemoryLedger,
    escrow: RoundEscrow,
}

impl House {
    /// Create fresh in-memory state without persistence
    pub fn new(creator: Identity, config: &WagerConfig) -> Result<Self, WagerError> {
        Ok(Self {
            inner: Arc::new(Mutex::new(HouseInner {
                ledger: InMemoryLedger::new(creator, config)?,
                escrow: RoundEscrow::new(config.min_stake),
            })),
            sink: None,
            store: None,
        })
    }

    /// Load state from `store`, or create and persist fresh state if none exists
    pub fn open(
        creator: Identity,
        config: &WagerConfig,
        store: SnapshotStore,
    ) -> Result<Self, WagerError> {
        let inner = match store.load()? {
            Some(snapshot) => {
                ensure_not_escrow(&snapshot.ledger.creator())?;
                if snapshot.ledger.creator() != creator {
                    tracing::warn!(
                        "Snapshot creator {} differs from configured creator {}; keeping snapshot",
                        snapshot.ledger.creator(),
                        creator
                    );
                }
                let mut escrow = snapshot.escrow;
                escrow.set_min_stake(config.min_stake);
                tracing::info!(
                    "Loaded snapshot from {} ({} rounds)",
                    store.path().display(),
                    escrow.rounds().count()
                );
                HouseInner {
                    ledger: snapshot.ledger,
                    escrow,
                }
            }
            None => {
                let inner = HouseInner {
                    ledger: InMemoryLedger::new(creator, config)?,
                    escrow: RoundEscrow::new(config.min_stake),
                };
                store.save(&inner.ledger, &inner.escrow)?;
                tracing::info!("Created new snapshot at {}", store.path().display());
                inner
            }
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
            sink: None,
            store: Some(Arc::new(store)),
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    // Reads

    pub fn creator(&self) -> Identity {
        self.lock().ledger.creator()
    }

    pub fn balance_of(&self, who: &Identity) -> Amount {
        self.lock().ledger.balance_of(who)
    }

    pub fn has_claimed(&self, who: &Identity) -> bool {
        self.lock().ledger.has_claimed(who)
    }

    pub fn summary(&self) -> LedgerSummary {
        let inner = self.lock();
        LedgerSummary {
            creator: inner.ledger.creator(),
            total_supply: inner.ledger.total_supply(),
            circulating: inner.ledger.circulating(),
            airdrop_pool: inner.ledger.airdrop_pool(),
            claim_amount: inner.ledger.claim_amount(),
            escrow_balance: inner.ledger.balance_of(&ESCROW_ACCOUNT),
            min_stake: inner.escrow.min_stake(),
            open_rounds: inner.escrow.open_rounds().count(),
        }
    }

    pub fn round(&self, id: RoundId) -> Option<Round> {
        self.lock().escrow.round(id).cloned()
    }

    pub fn open_rounds(&self) -> Vec<Round> {
        self.lock().escrow.open_rounds().cloned().collect()
    }

    // Ledger operations

    pub fn transfer(&self, caller: &Identity, to: &Identity, amount: Amount) -> Result<(), WagerError> {
        ensure_not_escrow(caller)?;
        ensure_not_escrow(to)?;
        self.commit(|inner| inner.ledger.transfer(caller, to, amount))
    }

    pub fn claim_airdrop(&self, caller: &Identity) -> Result<Amount, WagerError> {
        ensure_not_escrow(caller)?;
        self.commit(|inner| inner.ledger.claim_airdrop(caller))
    }

    pub fn set_airdrop_pool(&self, caller: &Identity, amount: Amount) -> Result<(), WagerError> {
        self.commit(|inner| inner.ledger.set_airdrop_pool(caller, amount))
    }

    // Round operations

    pub fn initiate_round(
        &self,
        caller: &Identity,
        stake: Amount,
        choice: Choice,
    ) -> Result<Round, WagerError> {
        self.commit_round(|inner| {
            inner
                .escrow
                .initiate_round(&mut inner.ledger, caller, stake, choice)
        })
    }

    pub fn accept_round(
        &self,
        caller: &Identity,
        round_id: RoundId,
        choice: Choice,
    ) -> Result<Round, WagerError> {
        self.commit_round(|inner| {
            inner
                .escrow
                .accept_round(&mut inner.ledger, caller, round_id, choice)
        })
    }

    pub fn terminate_round(&self, caller: &Identity, round_id: RoundId) -> Result<Round, WagerError> {
        self.commit_round(|inner| {
            inner
                .escrow
                .terminate_round(&mut inner.ledger, caller, round_id)
        })
    }

    fn lock(&self) -> MutexGuard<'_, HouseInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `op` under the lock and persist the result, rolling back if saving fails
    fn commit<R>(
        &self,
        op: impl FnOnce(&mut HouseInner) -> Result<R, WagerError>,
    ) -> Result<R, WagerError> {
        let mut inner = self.lock();
        let before = self.store.as_ref().map(|_| inner.clone());

        let result = op(&mut *inner)?;

        if let (Some(store), Some(before)) = (&self.store, before) {
            if let Err(e) = store.save(&inner.ledger, &inner.escrow) {
                tracing::error!("Failed to persist snapshot, rolling back: {}", e);
                *inner = before;
                return Err(e.into());
            }
        }
        Ok(result)
    }

    /// Commit a round transition, then publish its event outside the lock
    fn commit_round(
        &self,
        op: impl FnOnce(&mut HouseInner) -> Result<RoundEvent, WagerError>,
    ) -> Result<Round, WagerError> {
        let (round, event) = self.commit(|inner| {
            let event = op(inner)?;
            let round = inner
                .escrow
                .round(event.round_id())
                .cloned()
                .ok_or(WagerError::RoundNotFound(event.round_id()))?;
            Ok((round, event))
        })?;

        if let Some(sink) = &self.sink {
            sink.publish(event);
        }
        Ok(round)
    }
}
