//! Store module
//!
//! In-memory repositories for accounts and the transaction ledger, each
//! optionally backed by a JSON snapshot file.

mod accounts;
mod error;
mod ledger;
mod snapshot;

pub use accounts::{AccountStore, AccountsWriteGuard, EnrolledTemplate};
pub use error::StoreError;
pub use ledger::Ledger;
pub use snapshot::SnapshotFile;
