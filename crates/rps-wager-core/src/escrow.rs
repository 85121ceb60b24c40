//! Round escrow state machine.
//!
//! A round moves `Pending -> Settled` exactly once, either by acceptance or
//! by its initiator terminating it. Only the initiator's stake is ever held
//! in escrow; the acceptor pays directly to the initiator when they lose and
//! is never debited otherwise.

use crate::error::WagerError;
use crate::games::{resolve, Choice, Outcome};
use crate::ledger::{CreditLedger, Transfer};
use crate::protocol::{Amount, Identity, Round, RoundEvent, RoundId, RoundStatus};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Ledger account holding the stakes of pending rounds
pub const ESCROW_ACCOUNT: Identity = Identity::from_uuid(Uuid::nil());

/// Round table; balances stay in the ledger passed to each operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundEscrow {
    #[serde(with = "crate::protocol::amount_serde")]
    min_stake: Amount,
    next_id: RoundId,
    rounds: BTreeMap<RoundId, Round>,
}

impl RoundEscrow {
    pub fn new(min_stake: Amount) -> Self {
        Self {
            min_stake,
            next_id: RoundId(0),
            rounds: BTreeMap::new(),
        }
    }

    pub fn min_stake(&self) -> Amount {
        self.min_stake
    }

    pub fn set_min_stake(&mut self, min_stake: Amount) {
        self.min_stake = min_stake;
    }

    pub fn round(&self, id: RoundId) -> Option<&Round> {
        self.rounds.get(&id)
    }

    pub fn rounds(&self) -> impl Iterator<Item = &Round> {
        self.rounds.values()
    }

    /// Pending rounds in id order
    pub fn open_rounds(&self) -> impl Iterator<Item = &Round> {
        self.rounds.values().filter(|r| r.is_pending())
    }

    /// Sum of pending stakes; matches the escrow account balance
    pub fn escrowed_total(&self) -> Amount {
        self.open_rounds().map(|r| r.stake).sum()
    }

    /// Escrow `stake` from `caller` and open a new round
    pub fn initiate_round(
        &mut self,
        ledger: &mut dyn CreditLedger,
        caller: &Identity,
        stake: Amount,
        choice: Choice,
    ) -> Result<RoundEvent, WagerError> {
        ensure_not_escrow(caller)?;
        if stake < self.min_stake {
            return Err(WagerError::StakeTooLow {
                stake,
                minimum: self.min_stake,
            });
        }
        let available = ledger.balance_of(caller);
        if available < stake {
            return Err(WagerError::InsufficientBalance {
                available,
                required: stake,
            });
        }

        ledger.transfer(caller, &ESCROW_ACCOUNT, stake)?;

        let id = self.next_id;
        self.next_id = id.next();
        self.rounds
            .insert(id, Round::new(id, *caller, stake, choice));

        tracing::info!("Round {} initiated by {} with stake {}", id, caller, stake);

        Ok(RoundEvent::RoundInitiated {
            round_id: id,
            initiator: *caller,
            stake,
            choice,
        })
    }

    /// Accept a pending round and settle it immediately
    pub fn accept_round(
        &mut self,
        ledger: &mut dyn CreditLedger,
        caller: &Identity,
        round_id: RoundId,
        choice: Choice,
    ) -> Result<RoundEvent, WagerError> {
        ensure_not_escrow(caller)?;
        let round = self.pending_round(round_id)?;
        let (initiator, stake) = (round.initiator, round.stake);

        // Checked even though the acceptor is only debited on a loss
        let available = ledger.balance_of(caller);
        if available < stake {
            return Err(WagerError::InsufficientBalance {
                available,
                required: stake,
            });
        }

        let outcome = resolve(round.initiator_choice, choice);
        let transfers = match outcome {
            Outcome::AWins => vec![
                Transfer::new(ESCROW_ACCOUNT, initiator, stake),
                Transfer::new(*caller, initiator, stake),
            ],
            Outcome::BWins => vec![Transfer::new(ESCROW_ACCOUNT, *caller, stake)],
            Outcome::Draw => vec![Transfer::new(ESCROW_ACCOUNT, initiator, stake)],
        };
        ledger.transfer_batch(&transfers)?;

        let round = self
            .rounds
            .get_mut(&round_id)
            .ok_or(WagerError::RoundNotFound(round_id))?;
        round.acceptor = Some(*caller);
        round.acceptor_choice = Some(choice);
        round.outcome = Some(outcome);
        round.status = RoundStatus::Settled;
        round.settled_at = Some(Utc::now());

        tracing::info!(
            "Round {} accepted by {}: {} vs {}, {}",
            round_id,
            caller,
            round.initiator_choice,
            choice,
            outcome
        );

        Ok(RoundEvent::RoundSettled {
            round_id,
            initiator,
            acceptor: *caller,
            stake,
            outcome,
        })
    }

    /// Cancel a pending round and refund its initiator
    pub fn terminate_round(
        &mut self,
        ledger: &mut dyn CreditLedger,
        caller: &Identity,
        round_id: RoundId,
    ) -> Result<RoundEvent, WagerError> {
        let round = self
            .rounds
            .get(&round_id)
            .ok_or(WagerError::RoundNotFound(round_id))?;
        if round.initiator != *caller {
            return Err(WagerError::NotInitiator(round_id));
        }
        if !round.is_pending() {
            return Err(WagerError::RoundAlreadySettled(round_id));
        }
        let stake = round.stake;

        ledger.transfer(&ESCROW_ACCOUNT, caller, stake)?;

        let round = self
            .rounds
            .get_mut(&round_id)
            .ok_or(WagerError::RoundNotFound(round_id))?;
        round.status = RoundStatus::Settled;
        round.settled_at = Some(Utc::now());

        tracing::info!("Round {} terminated by {}", round_id, caller);

        Ok(RoundEvent::RoundTerminated {
            round_id,
            initiator: *caller,
            stake,
        })
    }

    fn pending_round(&self, round_id: RoundId) -> Result<&Round, WagerError> {
        let round = self
            .rounds
            .get(&round_id)
            .ok_or(WagerError::RoundNotFound(round_id))?;
        if !round.is_pending() {
            return Err(WagerError::RoundAlreadySettled(round_id));
        }
        Ok(round)
    }
}

pub(crate) fn ensure_not_escrow(who: &Identity) -> Result<(), WagerError> {
    if *who == ESCROW_ACCOUNT {
        return Err(WagerError::ReservedIdentity(*who));
    }
    Ok(())
}
