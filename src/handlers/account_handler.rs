//! Account Handler
//!
//! Signup, login/logout, balance lookup, PIN setup and bank linking.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::aggregate::Account;
use crate::auth::Session;
use crate::domain::{Amount, Balance, BankLinkRequest, DomainError, Pin};
use crate::error::AppError;
use crate::state::AppState;

use super::{CreateAccountCommand, LoginResult};

/// Starting balance granted on the first bank link, in cents (800.00..=1200.00)
const LINK_GRANT_MIN_CENTS: i64 = 80_000;
const LINK_GRANT_MAX_CENTS: i64 = 120_000;

/// Handler for account lifecycle operations
pub struct AccountHandler {
    state: AppState,
}

impl AccountHandler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    // =========================================================================
    // create_account
    // =========================================================================

    pub async fn create_account(&self, command: CreateAccountCommand) -> Result<Account, AppError> {
        let account = self.state.accounts.create(command.into()).await?;

        tracing::info!(
            account_id = account.id(),
            role = ?account.role(),
            "Account created"
        );

        Ok(account)
    }

    // =========================================================================
    // authenticate_login / logout
    // =========================================================================

    /// Check the login credential and open a session with a clean lockout
    pub async fn authenticate_login(
        &self,
        account_id: &str,
        credential: &str,
    ) -> Result<(LoginResult, Arc<Session>), AppError> {
        let account = match self.state.accounts.get(account_id.trim()).await {
            Some(account) if account.verify_credential(credential) => account,
            _ => {
                tracing::warn!(account_id, "Failed login attempt");
                return Err(AppError::InvalidCredentials);
            }
        };

        let session = self.state.sessions.open(account.id()).await;
        tracing::info!(account_id = account.id(), session_id = %session.id(), "Session opened");

        let result = LoginResult {
            session_id: session.id(),
            account_id: account.id().to_string(),
            display_name: account.display_name().to_string(),
        };
        Ok((result, session))
    }

    /// Close a session; its lockout state goes with it
    pub async fn logout(&self, session_id: Uuid) -> Result<(), AppError> {
        if !self.state.sessions.close(session_id).await {
            return Err(AppError::InvalidSession);
        }
        tracing::debug!(%session_id, "Session closed");
        Ok(())
    }

    // =========================================================================
    // get_balance
    // =========================================================================

    pub async fn get_balance(&self, account_id: &str) -> Result<Balance, AppError> {
        self.state
            .accounts
            .get_balance(account_id)
            .await
            .ok_or_else(|| DomainError::AccountNotFound(account_id.to_string()).into())
    }

    pub async fn get_account(&self, account_id: &str) -> Result<Account, AppError> {
        self.state
            .accounts
            .get(account_id)
            .await
            .ok_or_else(|| DomainError::AccountNotFound(account_id.to_string()).into())
    }

    // =========================================================================
    // set_pin
    // =========================================================================

    pub async fn set_pin(&self, account_id: &str, pin: &str) -> Result<(), AppError> {
        let pin: Pin = pin.parse()?;
        self.state
            .accounts
            .update(account_id, |account| {
                account.set_pin(pin);
                Ok(())
            })
            .await?;

        tracing::info!(account_id, "PIN set");
        Ok(())
    }

    // =========================================================================
    // link_bank
    // =========================================================================

    /// Link a bank account and adopt the form's contact details.
    ///
    /// An account with a zero balance receives a starting grant. The new
    /// email and phone must not belong to another account.
    pub async fn link_bank(
        &self,
        account_id: &str,
        request: BankLinkRequest,
    ) -> Result<Account, AppError> {
        let details = request.validate(Utc::now())?;
        let email = request.email.trim().to_string();
        let phone = request.phone.trim().to_string();

        let mut accounts = self.state.accounts.write().await;

        let original = accounts
            .get(account_id)
            .cloned()
            .ok_or_else(|| DomainError::AccountNotFound(account_id.to_string()))?;

        for other in accounts.iter().filter(|a| a.id() != account_id) {
            if other.email().eq_ignore_ascii_case(&email) {
                return Err(DomainError::duplicate("email", email).into());
            }
            if other.phone() == phone {
                return Err(DomainError::duplicate("phone", phone).into());
            }
        }

        let mut updated = original.clone();
        updated.link_bank(details, phone, email);

        let mut grant = None;
        if updated.balance().is_zero() {
            let cents = self
                .state
                .rng
                .between(LINK_GRANT_MIN_CENTS, LINK_GRANT_MAX_CENTS);
            let amount = Amount::from_cents(cents).map_err(DomainError::from)?;
            updated.credit(&amount)?;
            grant = Some(amount);
        }

        accounts.replace(updated.clone());
        if let Err(e) = accounts.flush().await {
            accounts.replace(original);
            return Err(e.into());
        }

        tracing::info!(
            account_id,
            grant = ?grant.map(|g| g.value()),
            "Bank account linked"
        );

        Ok(updated)
    }
}
