//! Command Handlers module
//!
//! Handlers that orchestrate business operations over the shared state.
//! Each handler coordinates the stores, the auth guards and the reward engine.

mod account_handler;
mod commands;
mod security_handler;
mod statement_handler;
mod transfer_handler;

#[cfg(test)]
mod tests;

pub use account_handler::AccountHandler;
pub use commands::*;
pub use security_handler::SecurityHandler;
pub use statement_handler::StatementHandler;
pub use transfer_handler::TransferHandler;
