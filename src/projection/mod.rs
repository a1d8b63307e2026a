//! Projection module
//!
//! Read models derived from the ledger on demand.

mod summary;

pub use summary::{CounterpartySpend, SpendingCategory, SpendingSummary};
