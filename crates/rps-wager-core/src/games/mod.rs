//! Game rules.

mod rps;

pub use rps::{resolve, Choice, Outcome};
