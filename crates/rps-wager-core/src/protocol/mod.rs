//! Protocol types and notifications.

mod messages;
mod types;

pub use messages::{BroadcastSink, EventSink, RoundEvent};
pub use types::{amount_serde, Amount, Identity, Round, RoundId, RoundStatus};
