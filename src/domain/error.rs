//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

use super::AmountError;

/// Domain-specific errors
///
/// These errors represent business rule violations and domain invariant failures.
/// They are independent of the storage and web layers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Insufficient balance for debit operation
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },

    /// Invalid amount (zero, negative, malformed, or exceeds limit)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Transfer to same account
    #[error("Cannot transfer to the same account")]
    SameAccountTransfer,

    /// PIN is not exactly four ASCII digits
    #[error("Invalid PIN: must be exactly 4 digits")]
    InvalidPin,

    /// Account has no PIN configured yet
    #[error("No PIN has been set for account {0}")]
    PinNotSet(String),

    /// Bank link form failed validation
    #[error("Invalid bank details: {0}")]
    InvalidBankDetails(String),

    /// Face embedding is empty or contains non-finite values
    #[error("Invalid face embedding: {0}")]
    InvalidEmbedding(String),

    /// Identifier, email, or phone already registered
    #[error("Duplicate {field}: {value}")]
    DuplicateIdentifier { field: &'static str, value: String },

    /// Business rule violation
    #[error("Business rule violation: {0}")]
    BusinessRuleViolation(String),
}

impl DomainError {
    /// Create an insufficient balance error
    pub fn insufficient_balance(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientBalance { required, available }
    }

    pub fn duplicate(field: &'static str, value: impl Into<String>) -> Self {
        Self::DuplicateIdentifier {
            field,
            value: value.into(),
        }
    }

    /// Check if this is a malformed-input error (caller corrects input)
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_)
                | Self::SameAccountTransfer
                | Self::InvalidPin
                | Self::PinNotSet(_)
                | Self::InvalidBankDetails(_)
                | Self::InvalidEmbedding(_)
                | Self::BusinessRuleViolation(_)
        )
    }

    /// Check if this is a conflict error (caller may choose a different value)
    pub fn is_conflict_error(&self) -> bool {
        matches!(
            self,
            Self::InsufficientBalance { .. } | Self::DuplicateIdentifier { .. }
        )
    }
}

impl From<AmountError> for DomainError {
    fn from(err: AmountError) -> Self {
        DomainError::InvalidAmount(err.to_string())
    }
}
