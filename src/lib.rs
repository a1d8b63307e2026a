//! UniPay Core Library
//!
//! Re-exports modules for integration testing and external use.

pub mod aggregate;
pub mod api;
pub mod auth;
pub mod domain;
pub mod handlers;
pub mod projection;
pub mod rewards;
pub mod store;

pub mod config;
mod error;
pub mod state;

pub use config::Config;
pub use domain::{Amount, AmountError, Balance, DomainError};
pub use error::{AppError, AppResult, ErrorKind, ErrorResponse};
pub use state::AppState;
