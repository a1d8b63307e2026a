//! Aggregate module
//!
//! Typed entities owned by the stores: accounts and transaction records.

pub mod account;
pub mod transaction;

pub use account::{Account, AccountRole, NewAccount};
pub use transaction::Transaction;
