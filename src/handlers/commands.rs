//! Command definitions
//!
//! Commands represent intentions to change the system state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{AccountRole, NewAccount, Transaction};

// =========================================================================
// CreateAccountCommand
// =========================================================================

/// Command to open a new account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountCommand {
    pub display_name: String,
    pub email: String,
    pub phone: String,
    pub credential: String,
    #[serde(default)]
    pub role: AccountRole,
}

impl CreateAccountCommand {
    pub fn new(display_name: String, email: String, phone: String, credential: String) -> Self {
        Self {
            display_name,
            email,
            phone,
            credential,
            role: AccountRole::Personal,
        }
    }

    pub fn as_merchant(mut self) -> Self {
        self.role = AccountRole::Merchant;
        self
    }
}

impl From<CreateAccountCommand> for NewAccount {
    fn from(cmd: CreateAccountCommand) -> Self {
        let draft = NewAccount::new(cmd.display_name, cmd.email, cmd.phone, cmd.credential);
        match cmd.role {
            AccountRole::Personal => draft,
            AccountRole::Merchant => draft.merchant(),
        }
    }
}

// =========================================================================
// TransferCommand
// =========================================================================

/// How the sender proves intent for one transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferAuth {
    /// The session owner's 4-digit PIN
    Pin(String),
    /// A live face embedding; the matched account becomes the receiver
    Face(Vec<f32>),
}

/// Command to transfer funds from the session's account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCommand {
    /// Required on the PIN path, ignored on the face path
    pub receiver_id: Option<String>,
    /// Amount to transfer (as string for precise decimal)
    pub amount: String,
    pub note: Option<String>,
    pub auth: TransferAuth,
}

impl TransferCommand {
    pub fn with_pin(receiver_id: String, amount: String, pin: String) -> Self {
        Self {
            receiver_id: Some(receiver_id),
            amount,
            note: None,
            auth: TransferAuth::Pin(pin),
        }
    }

    pub fn with_face(amount: String, embedding: Vec<f32>) -> Self {
        Self {
            receiver_id: None,
            amount,
            note: None,
            auth: TransferAuth::Face(embedding),
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.note = Some(note);
        self
    }

    pub fn to(mut self, receiver_id: String) -> Self {
        self.receiver_id = Some(receiver_id);
        self
    }
}

/// Result of a successful transfer
#[derive(Debug, Clone, Serialize)]
pub struct TransferReceipt {
    pub transaction: Transaction,
    /// Sender balance after debit and any cashback
    pub sender_balance: Decimal,
    /// Similarity of the face that picked the receiver, on the face path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_similarity: Option<f64>,
}

impl TransferReceipt {
    pub fn reward(&self) -> Decimal {
        self.transaction.reward_amount
    }
}

/// Result of a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResult {
    pub session_id: Uuid,
    pub account_id: String,
    pub display_name: String,
}
