//! Credit ledger abstraction.

mod memory;
mod traits;

pub use memory::InMemoryLedger;
pub use traits::{CreditLedger, Transfer};
