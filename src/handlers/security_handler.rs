//! Security Handler
//!
//! PIN verification behind the session lockout, face enrollment and face
//! authentication.

use chrono::Utc;

use crate::aggregate::Account;
use crate::auth::biometric::validate_embedding;
use crate::auth::{FaceMatch, LockState, PinCheck, Session};
use crate::domain::{Balance, DomainError, Pin};
use crate::error::AppError;
use crate::state::AppState;

/// Handler for PIN and biometric checks
pub struct SecurityHandler {
    state: AppState,
}

impl SecurityHandler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    // =========================================================================
    // authorize_pin
    // =========================================================================

    /// Check a PIN for the session's account.
    ///
    /// Order matters: an active lock is reported before the PIN is even
    /// parsed, and neither a malformed PIN nor a missing stored PIN consumes
    /// an attempt. The session's lockout stays held across the comparison so
    /// concurrent attempts are counted one at a time.
    pub async fn authorize_pin(&self, session: &Session, raw_pin: &str) -> Result<(), AppError> {
        let now = Utc::now();
        let mut lockout = session.lockout().await;

        if let LockState::Locked { remaining_seconds } = lockout.state(now) {
            return Err(AppError::PinLocked { remaining_seconds });
        }

        let candidate: Pin = raw_pin.trim().parse()?;

        let account = self
            .state
            .accounts
            .get(session.account_id())
            .await
            .ok_or_else(|| DomainError::AccountNotFound(session.account_id().to_string()))?;
        let expected = account
            .pin()
            .ok_or_else(|| DomainError::PinNotSet(account.id().to_string()))?;

        match lockout.verify(&self.state.lockout, &candidate, expected, now) {
            PinCheck::Verified => Ok(()),
            PinCheck::Rejected { attempts_remaining } => {
                tracing::warn!(
                    account_id = account.id(),
                    attempts_remaining,
                    "Incorrect PIN"
                );
                Err(AppError::IncorrectPin { attempts_remaining })
            }
            PinCheck::LockedOut { remaining_seconds } => {
                Err(AppError::PinLocked { remaining_seconds })
            }
        }
    }

    // =========================================================================
    // verify_pin (check balance)
    // =========================================================================

    /// Reveal the balance once the PIN checks out
    pub async fn verify_pin(&self, session: &Session, pin: &str) -> Result<Balance, AppError> {
        self.authorize_pin(session, pin).await?;

        self.state
            .accounts
            .get_balance(session.account_id())
            .await
            .ok_or_else(|| DomainError::AccountNotFound(session.account_id().to_string()).into())
    }

    // =========================================================================
    // set_biometric_template
    // =========================================================================

    pub async fn set_biometric_template(
        &self,
        account_id: &str,
        embedding: Vec<f32>,
    ) -> Result<(), AppError> {
        validate_embedding(&embedding)?;
        let dimensions = embedding.len();

        self.state
            .accounts
            .update(account_id, move |account| {
                account.set_biometric_template(embedding);
                Ok(())
            })
            .await?;

        tracing::info!(account_id, dimensions, "Face template enrolled");
        Ok(())
    }

    // =========================================================================
    // authenticate_by_face
    // =========================================================================

    /// Best enrolled template above the threshold.
    ///
    /// Scoring runs on a blocking thread over a copy of the templates, so no
    /// store lock is held while it runs.
    pub async fn match_face(&self, live: Vec<f32>) -> Result<FaceMatch, AppError> {
        validate_embedding(&live)?;

        let templates = self.state.accounts.enrolled_templates().await;
        let matcher = self.state.matcher;
        let scanned = templates.len();

        let found = tokio::task::spawn_blocking(move || matcher.best_match(&live, &templates))
            .await
            .map_err(|e| AppError::Internal(format!("Face scan task failed: {}", e)))?;

        match found {
            Some(face) => {
                tracing::debug!(
                    account_id = %face.account_id,
                    similarity = face.similarity,
                    "Face matched"
                );
                Ok(face)
            }
            None => {
                tracing::warn!(scanned, "Face not recognized");
                Err(AppError::FaceNotRecognized)
            }
        }
    }

    /// The account whose enrolled face matches, with its similarity
    pub async fn authenticate_by_face(&self, live: Vec<f32>) -> Result<(Account, f64), AppError> {
        let face = self.match_face(live).await?;
        let account = self
            .state
            .accounts
            .get(&face.account_id)
            .await
            .ok_or_else(|| DomainError::AccountNotFound(face.account_id.clone()))?;
        Ok((account, face.similarity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{AccountHandler, CreateAccountCommand};
    use rust_decimal_macros::dec;

    async fn account_with_pin(state: &AppState, pin: Option<&str>) -> Account {
        let accounts = AccountHandler::new(state.clone());
        let account = accounts
            .create_account(CreateAccountCommand::new(
                "Asha".to_string(),
                "asha@unipay.test".to_string(),
                "9876543210".to_string(),
                "pw".to_string(),
            ))
            .await
            .unwrap();
        if let Some(pin) = pin {
            accounts.set_pin(account.id(), pin).await.unwrap();
        }
        account
    }

    #[tokio::test]
    async fn test_verify_pin_reveals_balance() {
        let state = AppState::in_memory();
        let account = account_with_pin(&state, Some("1234")).await;
        state
            .accounts
            .update(account.id(), |a| {
                a.credit(&crate::domain::Amount::new(dec!(42.10)).unwrap())
            })
            .await
            .unwrap();
        let session = state.sessions.open(account.id()).await;

        let balance = SecurityHandler::new(state)
            .verify_pin(&session, "1234")
            .await
            .unwrap();
        assert_eq!(balance.value(), dec!(42.10));
    }

    #[tokio::test]
    async fn test_malformed_pin_consumes_no_attempt() {
        let state = AppState::in_memory();
        let account = account_with_pin(&state, Some("1234")).await;
        let session = state.sessions.open(account.id()).await;
        let handler = SecurityHandler::new(state);

        for bad in ["", "123", "12345", "abcd", "１２３４"] {
            assert!(matches!(
                handler.verify_pin(&session, bad).await,
                Err(AppError::Domain(DomainError::InvalidPin))
            ));
        }
        assert_eq!(session.lockout().await.failed_attempts(), 0);
    }

    #[tokio::test]
    async fn test_missing_pin_consumes_no_attempt() {
        let state = AppState::in_memory();
        let account = account_with_pin(&state, None).await;
        let session = state.sessions.open(account.id()).await;

        let err = SecurityHandler::new(state)
            .verify_pin(&session, "1234")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::PinNotSet(_))));
        assert_eq!(session.lockout().await.failed_attempts(), 0);
    }

    #[tokio::test]
    async fn test_lockout_after_three_failures() {
        let state = AppState::in_memory();
        let account = account_with_pin(&state, Some("1234")).await;
        let session = state.sessions.open(account.id()).await;
        let handler = SecurityHandler::new(state);

        assert!(matches!(
            handler.verify_pin(&session, "0000").await,
            Err(AppError::IncorrectPin { attempts_remaining: 2 })
        ));
        assert!(matches!(
            handler.verify_pin(&session, "0000").await,
            Err(AppError::IncorrectPin { attempts_remaining: 1 })
        ));
        let third = handler.verify_pin(&session, "0000").await.unwrap_err();
        assert!(matches!(third, AppError::PinLocked { remaining_seconds } if remaining_seconds <= 300 && remaining_seconds > 295));

        // The right PIN, and even a malformed one, report the lock
        assert!(matches!(
            handler.verify_pin(&session, "1234").await,
            Err(AppError::PinLocked { .. })
        ));
        assert!(matches!(
            handler.verify_pin(&session, "12").await,
            Err(AppError::PinLocked { .. })
        ));
        assert_eq!(session.lockout().await.failed_attempts(), 3);
    }

    #[tokio::test]
    async fn test_face_enrollment_and_authentication() {
        let state = AppState::in_memory();
        let account = account_with_pin(&state, None).await;
        let handler = SecurityHandler::new(state);

        let face = vec![0.2f32, 0.7, -0.1, 0.4];
        handler
            .set_biometric_template(account.id(), face.clone())
            .await
            .unwrap();

        let (found, similarity) = handler.authenticate_by_face(face).await.unwrap();
        assert_eq!(found.id(), account.id());
        assert!(similarity > 0.999);

        assert!(matches!(
            handler.authenticate_by_face(vec![-0.2, -0.7, 0.1, -0.4]).await,
            Err(AppError::FaceNotRecognized)
        ));
        assert!(matches!(
            handler.set_biometric_template(account.id(), vec![]).await,
            Err(AppError::Domain(DomainError::InvalidEmbedding(_)))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_attempts_in_one_session_are_counted_once_each() {
        let state = AppState::in_memory();
        let account = account_with_pin(&state, Some("1234")).await;
        let session = state.sessions.open(account.id()).await;

        let mut tasks = Vec::new();
        for _ in 0..6 {
            let handler = SecurityHandler::new(state.clone());
            let session = session.clone();
            tasks.push(tokio::spawn(async move {
                handler.verify_pin(&session, "0000").await
            }));
        }

        let mut incorrect = 0;
        let mut locked = 0;
        for task in tasks {
            match task.await.unwrap() {
                Err(AppError::IncorrectPin { .. }) => incorrect += 1,
                Err(AppError::PinLocked { .. }) => locked += 1,
                other => panic!("unexpected result: {:?}", other),
            }
        }

        // The third failure engages the lock and reports it
        assert_eq!(incorrect, 2);
        assert_eq!(locked, 4);
        assert_eq!(session.lockout().await.failed_attempts(), 3);
    }
}
