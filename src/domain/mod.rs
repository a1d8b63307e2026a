//! Domain module
//!
//! Core domain types and business rules.

pub mod amount;
pub mod bank;
pub mod credentials;
pub mod error;
pub mod identifier;

pub use amount::{round_money, Amount, AmountError, Balance};
pub use bank::{BankDetails, BankLink, BankLinkRequest};
pub use credentials::{CredentialHash, Pin};
pub use error::DomainError;
pub use identifier::{generate_id, is_merchant_id, IdKind, MERCHANT_PREFIX};
