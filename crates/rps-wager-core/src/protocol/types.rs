//! Protocol types.

use crate::games::{Choice, Outcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Credit amount in the smallest unit (18 decimals per credit)
pub type Amount = u128;

/// Opaque caller identity, supplied by the session layer
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(Uuid);

impl Identity {
    /// Create a new random identity
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from UUID
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for Identity {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequential round identifier, never reused
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(pub u64);

impl RoundId {
    /// The id following this one
    pub fn next(&self) -> RoundId {
        RoundId(self.0 + 1)
    }
}

impl FromStr for RoundId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Round status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Pending,
    Settled,
}

/// One two-party wager
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub initiator: Identity,
    /// Set only when the round was settled by acceptance
    pub acceptor: Option<Identity>,
    #[serde(with = "amount_serde")]
    pub stake: Amount,
    pub initiator_choice: Choice,
    pub acceptor_choice: Option<Choice>,
    pub status: RoundStatus,
    /// Set only when the round was settled by acceptance
    pub outcome: Option<Outcome>,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Round {
    /// Create a new pending round
    pub fn new(id: RoundId, initiator: Identity, stake: Amount, choice: Choice) -> Self {
        Self {
            id,
            initiator,
            acceptor: None,
            stake,
            initiator_choice: choice,
            acceptor_choice: None,
            status: RoundStatus::Pending,
            outcome: None,
            created_at: Utc::now(),
            settled_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RoundStatus::Pending
    }

    /// True if the round was cancelled by its initiator
    pub fn is_terminated(&self) -> bool {
        self.status == RoundStatus::Settled && self.acceptor.is_none()
    }
}

/// Serialize amounts as decimal strings; u128 does not fit JSON-safe integers.
pub mod amount_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &u128, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_generation() {
        let id1 = Identity::new();
        let id2 = Identity::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_identity_parse_display() {
        let id = Identity::new();
        let parsed: Identity = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<Identity>().is_err());
    }

    #[test]
    fn test_round_id_sequence() {
        assert_eq!(RoundId(0).next(), RoundId(1));
        assert_eq!("42".parse::<RoundId>().unwrap(), RoundId(42));
    }

    #[test]
    fn test_new_round_is_pending() {
        let round = Round::new(RoundId(0), Identity::new(), 100, Choice::Rock);
        assert!(round.is_pending());
        assert!(!round.is_terminated());
        assert!(round.acceptor.is_none());
        assert!(round.outcome.is_none());
    }

    #[test]
    fn test_stake_serialized_as_string() {
        let stake = 200 * 10u128.pow(18);
        let round = Round::new(RoundId(1), Identity::new(), stake, Choice::Paper);
        let json = serde_json::to_value(&round).unwrap();
        assert_eq!(json["stake"], "200000000000000000000");
        assert_eq!(json["status"], "pending");

        let back: Round = serde_json::from_value(json).unwrap();
        assert_eq!(back.stake, stake);
    }
}
