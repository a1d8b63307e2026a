//! Statement Handler
//!
//! Read-only views over the ledger: statements, loyalty standings and the
//! spending summary.

use crate::aggregate::Transaction;
use crate::domain::DomainError;
use crate::error::AppError;
use crate::projection::SpendingSummary;
use crate::rewards::{customer_rewards, merchant_rewards, MerchantRewards};
use crate::state::AppState;

pub struct StatementHandler {
    state: AppState,
}

impl StatementHandler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Transactions sent or received by the account, most recent first
    pub async fn get_statement(&self, account_id: &str) -> Result<Vec<Transaction>, AppError> {
        self.ensure_exists(account_id).await?;
        Ok(self.state.ledger.statement(account_id).await)
    }

    pub async fn get_merchant_rewards(&self, merchant_id: &str) -> Result<MerchantRewards, AppError> {
        let merchant = self
            .state
            .accounts
            .get(merchant_id)
            .await
            .ok_or_else(|| DomainError::AccountNotFound(merchant_id.to_string()))?;
        if !merchant.is_merchant() {
            return Err(AppError::InvalidRequest(format!(
                "{} is not a merchant account",
                merchant_id
            )));
        }

        let received = self
            .state
            .ledger
            .filtered(|tx| tx.receiver_id == merchant_id)
            .await;
        Ok(merchant_rewards(merchant.id(), merchant.display_name(), &received))
    }

    /// Loyalty standing with every merchant the account has paid
    pub async fn get_customer_rewards(
        &self,
        account_id: &str,
    ) -> Result<Vec<MerchantRewards>, AppError> {
        self.ensure_exists(account_id).await?;
        let sent = self
            .state
            .ledger
            .filtered(|tx| tx.sender_id == account_id)
            .await;
        Ok(customer_rewards(account_id, &sent))
    }

    pub async fn get_spending_summary(&self, account_id: &str) -> Result<SpendingSummary, AppError> {
        let balance = self
            .state
            .accounts
            .get_balance(account_id)
            .await
            .ok_or_else(|| DomainError::AccountNotFound(account_id.to_string()))?;
        let history = self
            .state
            .ledger
            .filtered(|tx| tx.involves(account_id))
            .await;
        Ok(SpendingSummary::build(account_id, &balance, &history))
    }

    async fn ensure_exists(&self, account_id: &str) -> Result<(), AppError> {
        if self.state.accounts.get(account_id).await.is_none() {
            return Err(DomainError::AccountNotFound(account_id.to_string()).into());
        }
        Ok(())
    }
}
