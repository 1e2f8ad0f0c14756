//! Daily quota accounting and request signatures
//!
//! The ledger has no counter of its own: spend is derived by summing the
//! day's non-cached audit rows, so a crash can neither lose nor double-count
//! cost. Signatures key the response cache and make repeated requests free.

mod ledger;
mod signature;

pub use ledger::{today_utc, CostLedger};
pub use signature::request_signature;
