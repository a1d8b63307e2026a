//! Error handling module
//!
//! Centralized error types, the error taxonomy, and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::domain::DomainError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Broad error classes; the presentation layer picks messaging per class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input, caller corrects it
    Validation,
    /// Unknown account or transaction
    NotFound,
    /// Duplicate identifier or insufficient balance
    Conflict,
    /// Wrong PIN, no face match, lockout, bad login
    Authentication,
    /// Balance and ledger disagreed mid-transfer
    Consistency,
    /// Infrastructure failure
    Internal,
}

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid account id or credential")]
    InvalidCredentials,

    #[error("Incorrect PIN ({attempts_remaining} attempts remaining)")]
    IncorrectPin { attempts_remaining: u32 },

    #[error("Too many PIN attempts, locked for {remaining_seconds} more seconds")]
    PinLocked { remaining_seconds: u64 },

    #[error("Face not recognized")]
    FaceNotRecognized,

    #[error("Session is missing or expired")]
    InvalidSession,

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Server errors (5xx)
    /// Balances and ledger could not be brought back into agreement
    #[error("Transfer {transaction_id} left balances and ledger inconsistent: {reason}")]
    Consistency {
        transaction_id: String,
        reason: String,
    },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidRequest(_) => ErrorKind::Validation,
            AppError::InvalidCredentials
            | AppError::IncorrectPin { .. }
            | AppError::PinLocked { .. }
            | AppError::FaceNotRecognized
            | AppError::InvalidSession => ErrorKind::Authentication,
            AppError::Domain(domain_err) => match domain_err {
                DomainError::AccountNotFound(_) => ErrorKind::NotFound,
                e if e.is_conflict_error() => ErrorKind::Conflict,
                _ => ErrorKind::Validation,
            },
            AppError::Consistency { .. } => ErrorKind::Consistency,
            AppError::Store(_) | AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::IncorrectPin { .. } => "incorrect_pin",
            AppError::PinLocked { .. } => "pin_locked",
            AppError::FaceNotRecognized => "face_not_recognized",
            AppError::InvalidSession => "invalid_session",
            AppError::Domain(domain_err) => match domain_err {
                DomainError::InsufficientBalance { .. } => "insufficient_balance",
                DomainError::InvalidAmount(_) => "invalid_amount",
                DomainError::AccountNotFound(_) => "account_not_found",
                DomainError::SameAccountTransfer => "same_account_transfer",
                DomainError::InvalidPin => "invalid_pin",
                DomainError::PinNotSet(_) => "pin_not_set",
                DomainError::InvalidBankDetails(_) => "invalid_bank_details",
                DomainError::InvalidEmbedding(_) => "invalid_embedding",
                DomainError::DuplicateIdentifier { .. } => "duplicate_identifier",
                DomainError::BusinessRuleViolation(_) => "business_rule_violation",
            },
            AppError::Consistency { .. } => "consistency_error",
            AppError::Store(_) => "storage_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = match (&self, kind) {
            (AppError::PinLocked { .. }, _) => StatusCode::TOO_MANY_REQUESTS,
            (_, ErrorKind::Validation) => StatusCode::BAD_REQUEST,
            (_, ErrorKind::NotFound) => StatusCode::NOT_FOUND,
            (_, ErrorKind::Conflict) => StatusCode::CONFLICT,
            (_, ErrorKind::Authentication) => StatusCode::UNAUTHORIZED,
            (_, ErrorKind::Consistency) | (_, ErrorKind::Internal) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Internal details stay in the logs
        let error = match kind {
            ErrorKind::Consistency | ErrorKind::Internal => {
                tracing::error!(error = %self, "Request failed");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        let details = match &self {
            AppError::PinLocked { remaining_seconds } => {
                Some(json!({ "remaining_seconds": remaining_seconds }))
            }
            AppError::IncorrectPin { attempts_remaining } => {
                Some(json!({ "attempts_remaining": attempts_remaining }))
            }
            AppError::Domain(DomainError::InsufficientBalance { required, available }) => {
                Some(json!({ "required": required, "available": available }))
            }
            _ => None,
        };

        let body = ErrorResponse {
            error,
            error_code: self.error_code().to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_taxonomy() {
        assert_eq!(
            AppError::from(DomainError::InvalidPin).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            AppError::from(DomainError::AccountNotFound("x".into())).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AppError::from(DomainError::insufficient_balance(Decimal::ONE, Decimal::ZERO)).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            AppError::PinLocked { remaining_seconds: 12 }.kind(),
            ErrorKind::Authentication
        );
        assert_eq!(
            AppError::Consistency {
                transaction_id: "t".into(),
                reason: "disk".into()
            }
            .kind(),
            ErrorKind::Consistency
        );
    }

    #[test]
    fn test_status_codes() {
        let status = |e: AppError| e.into_response().status();
        assert_eq!(status(DomainError::InvalidPin.into()), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(DomainError::AccountNotFound("x".into()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(DomainError::duplicate("email", "x").into()),
            StatusCode::CONFLICT
        );
        assert_eq!(status(AppError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(AppError::PinLocked { remaining_seconds: 1 }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
