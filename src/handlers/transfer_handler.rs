//! Transfer Handler
//!
//! Authenticates a transfer, moves the funds, runs the cashback lottery and
//! records the ledger entry as one unit.

use chrono::Utc;

use crate::aggregate::Transaction;
use crate::auth::Session;
use crate::domain::{Amount, DomainError};
use crate::error::AppError;
use crate::state::AppState;

use super::{SecurityHandler, TransferAuth, TransferCommand, TransferReceipt};

// =========================================================================
// TransferHandler
// =========================================================================

/// Handler for balance transfers
pub struct TransferHandler {
    state: AppState,
    security: SecurityHandler,
}

impl TransferHandler {
    pub fn new(state: AppState) -> Self {
        Self {
            security: SecurityHandler::new(state.clone()),
            state,
        }
    }

    /// Execute the transfer command on behalf of the session's account.
    ///
    /// Nothing is mutated unless authentication and validation both pass.
    /// Once mutation starts, balances, cashback and the ledger entry either
    /// all land or are all undone.
    pub async fn execute(
        &self,
        command: TransferCommand,
        session: &Session,
    ) -> Result<TransferReceipt, AppError> {
        let sender_id = session.account_id().to_string();

        // Parse and validate amount
        let amount: Amount = command
            .amount
            .trim()
            .parse()
            .map_err(DomainError::from)?;

        // Resolve the authentication path and the receiver
        let (receiver_id, face_similarity) = match command.auth {
            TransferAuth::Pin(pin) => {
                let receiver_id = command
                    .receiver_id
                    .map(|id| id.trim().to_string())
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| AppError::InvalidRequest("receiver_id is required".to_string()))?;
                self.security.authorize_pin(session, &pin).await?;
                (receiver_id, None)
            }
            TransferAuth::Face(embedding) => {
                let face = self.security.match_face(embedding).await?;
                if let Some(requested) = command.receiver_id.as_deref() {
                    if requested != face.account_id {
                        tracing::debug!(
                            requested,
                            matched = %face.account_id,
                            "Face match overrides requested receiver"
                        );
                    }
                }
                (face.account_id, Some(face.similarity))
            }
        };

        if receiver_id == sender_id {
            return Err(DomainError::SameAccountTransfer.into());
        }

        let note = command.note.filter(|n| !n.trim().is_empty());

        // Global write lock: validate, mutate, append and flush as one unit
        let mut accounts = self.state.accounts.write().await;

        let sender = accounts
            .get(&sender_id)
            .cloned()
            .ok_or_else(|| DomainError::AccountNotFound(sender_id.clone()))?;
        let receiver = accounts
            .get(&receiver_id)
            .cloned()
            .ok_or_else(|| DomainError::AccountNotFound(receiver_id.clone()))?;

        let reward = self.state.cashback.draw(self.state.rng.as_ref());

        let mut debited = sender.clone();
        debited.debit(&amount)?;
        if let Some(reward) = &reward {
            debited.credit(reward)?;
        }
        let mut credited = receiver.clone();
        credited.credit(&amount)?;

        accounts.replace(debited.clone());
        accounts.replace(credited);

        let timestamp = Utc::now();
        let appended = self
            .state
            .ledger
            .append(|id| {
                Transaction::record(id, &sender, &receiver, amount, reward, note, timestamp)
            })
            .await;

        let transaction = match appended {
            Ok(tx) => tx,
            Err(e) => {
                accounts.replace(sender);
                accounts.replace(receiver);
                return Err(e.into());
            }
        };

        if let Err(e) = accounts.flush().await {
            accounts.replace(sender);
            accounts.replace(receiver);

            if let Err(retract_err) = self.state.ledger.retract(&transaction.id).await {
                tracing::error!(
                    transaction_id = %transaction.id,
                    error = %retract_err,
                    "CRITICAL: ledger entry could not be retracted after failed balance write"
                );
                return Err(AppError::Consistency {
                    transaction_id: transaction.id,
                    reason: format!("{}; retract failed: {}", e, retract_err),
                });
            }

            return Err(e.into());
        }

        drop(accounts);

        tracing::info!(
            transaction_id = %transaction.id,
            sender = %transaction.sender_id,
            receiver = %transaction.receiver_id,
            amount = %transaction.amount,
            reward = %transaction.reward_amount,
            face = face_similarity.is_some(),
            "Transfer committed"
        );

        Ok(TransferReceipt {
            sender_balance: debited.balance().value(),
            transaction,
            face_similarity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_command() {
        let cmd = TransferCommand::with_pin(
            "Mzuzu1".to_string(),
            "100.00".to_string(),
            "1234".to_string(),
        )
        .with_note("Lunch".to_string());

        assert_eq!(cmd.amount, "100.00");
        assert_eq!(cmd.receiver_id.as_deref(), Some("Mzuzu1"));
        assert_eq!(cmd.note, Some("Lunch".to_string()));
        assert_eq!(cmd.auth, TransferAuth::Pin("1234".to_string()));
    }

    #[test]
    fn test_face_command_has_no_receiver() {
        let cmd = TransferCommand::with_face("5".to_string(), vec![0.1, 0.2]);
        assert!(cmd.receiver_id.is_none());
        assert!(matches!(cmd.auth, TransferAuth::Face(_)));
    }
}
