//! Handler tests
//!
//! Transfer orchestration over in-memory state.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::aggregate::Account;
    use crate::auth::Session;
    use crate::domain::{Amount, DomainError};
    use crate::error::AppError;
    use crate::handlers::{
        AccountHandler, CreateAccountCommand, SecurityHandler, StatementHandler, TransferCommand,
        TransferHandler,
    };
    use crate::rewards::FixedRandom;
    use crate::state::AppState;

    struct Fixture {
        state: AppState,
        sender: Account,
        receiver: Account,
        session: Arc<Session>,
    }

    async fn open_account(state: &AppState, name: &str, n: u32, merchant: bool) -> Account {
        let mut cmd = CreateAccountCommand::new(
            name.to_string(),
            format!("{}@unipay.test", name.to_lowercase()),
            format!("90000000{:02}", n),
            "pw".to_string(),
        );
        if merchant {
            cmd = cmd.as_merchant();
        }
        AccountHandler::new(state.clone()).create_account(cmd).await.unwrap()
    }

    async fn fund(state: &AppState, account_id: &str, value: Decimal) {
        state
            .accounts
            .update(account_id, |a| a.credit(&Amount::new(value).unwrap()))
            .await
            .unwrap();
    }

    async fn balance(state: &AppState, account_id: &str) -> Decimal {
        state.accounts.get_balance(account_id).await.unwrap().value()
    }

    async fn fixture(state: AppState, sender_funds: Decimal) -> Fixture {
        let sender = open_account(&state, "Asha", 1, false).await;
        let receiver = open_account(&state, "Ravi", 2, false).await;
        if sender_funds > Decimal::ZERO {
            fund(&state, sender.id(), sender_funds).await;
        }
        AccountHandler::new(state.clone())
            .set_pin(sender.id(), "1234")
            .await
            .unwrap();
        let session = state.sessions.open(sender.id()).await;
        Fixture {
            state,
            sender,
            receiver,
            session,
        }
    }

    fn pin_transfer(to: &Account, amount: &str, pin: &str) -> TransferCommand {
        TransferCommand::with_pin(to.id().to_string(), amount.to_string(), pin.to_string())
    }

    // =========================================================================
    // Balance movement
    // =========================================================================

    #[tokio::test]
    async fn test_transfer_moves_exact_amount() {
        let fx = fixture(AppState::in_memory().with_random(FixedRandom::never()), dec!(100)).await;
        let handler = TransferHandler::new(fx.state.clone());

        let receipt = handler
            .execute(
                pin_transfer(&fx.receiver, "40", "1234").with_note("Books".to_string()),
                &fx.session,
            )
            .await
            .unwrap();

        assert_eq!(receipt.sender_balance, dec!(60));
        assert_eq!(receipt.reward(), Decimal::ZERO);
        assert_eq!(balance(&fx.state, fx.sender.id()).await, dec!(60));
        assert_eq!(balance(&fx.state, fx.receiver.id()).await, dec!(40));

        let tx = &receipt.transaction;
        assert_eq!(tx.id.len(), 10);
        assert_eq!(tx.sender_display_name, "Asha");
        assert_eq!(tx.receiver_display_name, "Ravi");
        assert_eq!(tx.amount.value(), dec!(40));
        assert_eq!(tx.note.as_deref(), Some("Books"));
        assert_eq!(fx.state.ledger.get(&tx.id).await.as_ref(), Some(tx));
    }

    #[tokio::test]
    async fn test_reward_is_credited_to_sender_only() {
        let state = AppState::in_memory().with_random(FixedRandom::always(1_234));
        let fx = fixture(state, dec!(100)).await;

        let receipt = TransferHandler::new(fx.state.clone())
            .execute(pin_transfer(&fx.receiver, "40", "1234"), &fx.session)
            .await
            .unwrap();

        assert_eq!(receipt.reward(), dec!(12.34));
        assert_eq!(receipt.sender_balance, dec!(72.34));
        assert_eq!(balance(&fx.state, fx.sender.id()).await, dec!(72.34));
        assert_eq!(balance(&fx.state, fx.receiver.id()).await, dec!(40));

        // Conservation: the only new money is the reward
        let total = balance(&fx.state, fx.sender.id()).await
            + balance(&fx.state, fx.receiver.id()).await;
        assert_eq!(total, dec!(100) + receipt.reward());
    }

    #[tokio::test]
    async fn test_amount_rounds_to_cents() {
        let fx = fixture(AppState::in_memory().with_random(FixedRandom::never()), dec!(100)).await;

        let receipt = TransferHandler::new(fx.state.clone())
            .execute(pin_transfer(&fx.receiver, "10.005", "1234"), &fx.session)
            .await
            .unwrap();

        assert_eq!(receipt.transaction.amount.value(), dec!(10.01));
        assert_eq!(balance(&fx.state, fx.sender.id()).await, dec!(89.99));
    }

    // =========================================================================
    // Validation failures leave state untouched
    // =========================================================================

    #[tokio::test]
    async fn test_insufficient_balance_mutates_nothing() {
        let fx = fixture(AppState::in_memory().with_random(FixedRandom::always(5_000)), dec!(30)).await;

        let err = TransferHandler::new(fx.state.clone())
            .execute(pin_transfer(&fx.receiver, "30.01", "1234"), &fx.session)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Domain(DomainError::InsufficientBalance { .. })
        ));
        assert_eq!(balance(&fx.state, fx.sender.id()).await, dec!(30));
        assert_eq!(balance(&fx.state, fx.receiver.id()).await, dec!(0));
        assert!(fx.state.ledger.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalid_amounts_rejected_before_pin_check() {
        let fx = fixture(AppState::in_memory(), dec!(100)).await;
        let handler = TransferHandler::new(fx.state.clone());

        for amount in ["0", "-5", "abc", "", "0.001"] {
            let err = handler
                .execute(pin_transfer(&fx.receiver, amount, "0000"), &fx.session)
                .await
                .unwrap_err();
            assert!(
                matches!(err, AppError::Domain(DomainError::InvalidAmount(_))),
                "amount {:?} gave {:?}",
                amount,
                err
            );
        }
        assert_eq!(fx.session.lockout().await.failed_attempts(), 0);
        assert!(fx.state.ledger.is_empty().await);
    }

    #[tokio::test]
    async fn test_self_transfer_rejected() {
        let fx = fixture(AppState::in_memory(), dec!(100)).await;

        let err = TransferHandler::new(fx.state.clone())
            .execute(pin_transfer(&fx.sender, "10", "1234"), &fx.session)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Domain(DomainError::SameAccountTransfer)));
        assert_eq!(balance(&fx.state, fx.sender.id()).await, dec!(100));
    }

    #[tokio::test]
    async fn test_unknown_receiver() {
        let fx = fixture(AppState::in_memory(), dec!(100)).await;

        let err = TransferHandler::new(fx.state.clone())
            .execute(
                TransferCommand::with_pin("zzzzzz".into(), "10".into(), "1234".into()),
                &fx.session,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Domain(DomainError::AccountNotFound(_))));
        assert_eq!(balance(&fx.state, fx.sender.id()).await, dec!(100));
    }

    #[tokio::test]
    async fn test_pin_path_requires_receiver() {
        let fx = fixture(AppState::in_memory(), dec!(100)).await;
        let mut cmd = pin_transfer(&fx.receiver, "10", "1234");
        cmd.receiver_id = Some("  ".to_string());

        let err = TransferHandler::new(fx.state.clone())
            .execute(cmd, &fx.session)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    // =========================================================================
    // PIN path
    // =========================================================================

    #[tokio::test]
    async fn test_wrong_pin_blocks_transfer_and_locks_session() {
        let fx = fixture(AppState::in_memory(), dec!(100)).await;
        let handler = TransferHandler::new(fx.state.clone());

        for remaining in [2, 1] {
            let err = handler
                .execute(pin_transfer(&fx.receiver, "10", "9999"), &fx.session)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                AppError::IncorrectPin { attempts_remaining } if attempts_remaining == remaining
            ));
        }
        let err = handler
            .execute(pin_transfer(&fx.receiver, "10", "9999"), &fx.session)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PinLocked { .. }));

        // Locked: the correct PIN no longer works for transfers or balance checks
        let err = handler
            .execute(pin_transfer(&fx.receiver, "10", "1234"), &fx.session)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PinLocked { .. }));
        let err = SecurityHandler::new(fx.state.clone())
            .verify_pin(&fx.session, "1234")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PinLocked { .. }));

        assert_eq!(balance(&fx.state, fx.sender.id()).await, dec!(100));
        assert!(fx.state.ledger.is_empty().await);

        // A new session starts with a clean lockout
        let fresh = fx.state.sessions.open(fx.sender.id()).await;
        handler
            .execute(pin_transfer(&fx.receiver, "10", "1234"), &fresh)
            .await
            .unwrap();
    }

    // =========================================================================
    // Face path
    // =========================================================================

    #[tokio::test]
    async fn test_face_match_picks_receiver_without_pin() {
        let fx = fixture(AppState::in_memory().with_random(FixedRandom::never()), dec!(100)).await;
        let merchant = open_account(&fx.state, "Zuzu", 3, true).await;

        let security = SecurityHandler::new(fx.state.clone());
        security
            .set_biometric_template(fx.receiver.id(), vec![0.9, 0.1, 0.3, 0.2])
            .await
            .unwrap();
        security
            .set_biometric_template(merchant.id(), vec![0.1, 0.9, 0.2, 0.4])
            .await
            .unwrap();

        // Caller asked for Ravi, but the face belongs to the merchant
        let cmd = TransferCommand::with_face("25".to_string(), vec![0.12, 0.88, 0.21, 0.41])
            .to(fx.receiver.id().to_string());
        let receipt = TransferHandler::new(fx.state.clone())
            .execute(cmd, &fx.session)
            .await
            .unwrap();

        assert_eq!(receipt.transaction.receiver_id, merchant.id());
        assert!(receipt.face_similarity.unwrap() > 0.9);
        assert_eq!(balance(&fx.state, merchant.id()).await, dec!(25));
        assert_eq!(balance(&fx.state, fx.receiver.id()).await, dec!(0));
        assert_eq!(fx.session.lockout().await.failed_attempts(), 0);
    }

    #[tokio::test]
    async fn test_unrecognized_face_mutates_nothing() {
        let fx = fixture(AppState::in_memory(), dec!(100)).await;
        SecurityHandler::new(fx.state.clone())
            .set_biometric_template(fx.receiver.id(), vec![1.0, 0.0, 0.0])
            .await
            .unwrap();

        let err = TransferHandler::new(fx.state.clone())
            .execute(
                TransferCommand::with_face("25".to_string(), vec![0.0, 1.0, 0.0]),
                &fx.session,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::FaceNotRecognized));
        assert_eq!(balance(&fx.state, fx.sender.id()).await, dec!(100));
    }

    #[tokio::test]
    async fn test_own_face_is_a_self_transfer() {
        let fx = fixture(AppState::in_memory(), dec!(100)).await;
        SecurityHandler::new(fx.state.clone())
            .set_biometric_template(fx.sender.id(), vec![0.3, 0.3, 0.9])
            .await
            .unwrap();

        let err = TransferHandler::new(fx.state.clone())
            .execute(
                TransferCommand::with_face("5".to_string(), vec![0.3, 0.3, 0.9]),
                &fx.session,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::SameAccountTransfer)));
    }

    // =========================================================================
    // Statements and rewards
    // =========================================================================

    #[tokio::test]
    async fn test_statement_and_merchant_discount_tiers() {
        let fx = fixture(AppState::in_memory().with_random(FixedRandom::never()), dec!(1000)).await;
        let merchant = open_account(&fx.state, "Kepler", 3, true).await;
        let transfers = TransferHandler::new(fx.state.clone());
        let statements = StatementHandler::new(fx.state.clone());

        for i in 0..6 {
            let amount = if i == 5 { "20" } else { "50" };
            transfers
                .execute(pin_transfer(&merchant, amount, "1234"), &fx.session)
                .await
                .unwrap();
        }
        // Only five transfers reached 50.00
        let rewards = statements.get_merchant_rewards(merchant.id()).await.unwrap();
        assert_eq!(rewards.visit_count, 6);
        assert_eq!(rewards.total_spent, dec!(270));
        assert_eq!(rewards.qualifying_count, 5);
        assert_eq!(rewards.discount, dec!(25));

        transfers
            .execute(pin_transfer(&fx.receiver, "5", "1234"), &fx.session)
            .await
            .unwrap();

        let statement = statements.get_statement(fx.sender.id()).await.unwrap();
        assert_eq!(statement.len(), 7);
        assert_eq!(statement[0].receiver_id, fx.receiver.id());

        let customer = statements.get_customer_rewards(fx.sender.id()).await.unwrap();
        assert_eq!(customer.len(), 1);
        assert_eq!(customer[0].merchant_id, merchant.id());
        assert_eq!(customer[0].discount, dec!(25));

        let summary = statements.get_spending_summary(fx.sender.id()).await.unwrap();
        assert_eq!(summary.total_expense, dec!(275));
        assert_eq!(summary.current_balance, dec!(725));

        assert!(matches!(
            statements.get_merchant_rewards(fx.receiver.id()).await,
            Err(AppError::InvalidRequest(_))
        ));
    }
}
