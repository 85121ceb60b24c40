//! Round notifications.

use crate::games::{Choice, Outcome};
use crate::protocol::{amount_serde, Amount, Identity, RoundId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Notification published after a successful round transition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundEvent {
    /// A new round is open for acceptance
    RoundInitiated {
        round_id: RoundId,
        initiator: Identity,
        #[serde(with = "amount_serde")]
        stake: Amount,
        choice: Choice,
    },
    RoundSettled {
        round_id: RoundId,
        initiator: Identity,
        acceptor: Identity,
        #[serde(with = "amount_serde")]
        stake: Amount,
        outcome: Outcome,
    },
    RoundTerminated {
        round_id: RoundId,
        initiator: Identity,
        #[serde(with = "amount_serde")]
        stake: Amount,
    },
}

impl RoundEvent {
    pub fn round_id(&self) -> RoundId {
        match self {
            RoundEvent::RoundInitiated { round_id, .. }
            | RoundEvent::RoundSettled { round_id, .. }
            | RoundEvent::RoundTerminated { round_id, .. } => *round_id,
        }
    }
}

/// Outbound notification sink.
///
/// Publishing is best effort: a sink must not fail or block the caller.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: RoundEvent);
}

/// Sink that fans events out over a tokio broadcast channel
#[derive(Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<RoundEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoundEvent> {
        self.sender.subscribe()
    }
}

impl EventSink for BroadcastSink {
    fn publish(&self, event: RoundEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn initiated(id: u64) -> RoundEvent {
        RoundEvent::RoundInitiated {
            round_id: RoundId(id),
            initiator: Identity::new(),
            stake: 50,
            choice: Choice::Paper,
        }
    }

    #[test]
    fn test_event_serialization() {
        let event = initiated(4);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "round_initiated");
        assert_eq!(json["round_id"], 4);
        assert_eq!(json["stake"], "50");
        assert_eq!(json["choice"], "paper");

        let back: RoundEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[tokio::test]
    async fn test_broadcast_sink_delivers() {
        let sink = BroadcastSink::new(8);
        let mut rx = sink.subscribe();

        sink.publish(initiated(1));
        sink.publish(initiated(2));

        assert_eq!(rx.recv().await.unwrap().round_id(), RoundId(1));
        assert_eq!(rx.recv().await.unwrap().round_id(), RoundId(2));
    }

    #[test]
    fn test_broadcast_sink_without_subscribers() {
        let sink = BroadcastSink::new(1);
        sink.publish(initiated(0));
    }
}
