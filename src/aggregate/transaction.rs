//! Transaction record
//!
//! An immutable record of a completed transfer. Display names are copied at
//! write time so later renames do not rewrite history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::Amount;

use super::Account;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub sender_id: String,
    pub sender_display_name: String,
    pub receiver_id: String,
    pub receiver_display_name: String,
    pub amount: Amount,
    /// Cashback credited to the sender, zero when the lottery missed
    #[serde(default)]
    pub reward_amount: Decimal,
    #[serde(default)]
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Build the record for a transfer between two loaded accounts
    pub fn record(
        id: String,
        sender: &Account,
        receiver: &Account,
        amount: Amount,
        reward: Option<Amount>,
        note: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            sender_id: sender.id().to_string(),
            sender_display_name: sender.display_name().to_string(),
            receiver_id: receiver.id().to_string(),
            receiver_display_name: receiver.display_name().to_string(),
            amount,
            reward_amount: reward.map(|r| r.value()).unwrap_or(Decimal::ZERO),
            note: note.filter(|n| !n.trim().is_empty()),
            timestamp,
        }
    }

    pub fn involves(&self, account_id: &str) -> bool {
        self.sender_id == account_id || self.receiver_id == account_id
    }

    pub fn has_reward(&self) -> bool {
        self.reward_amount > Decimal::ZERO
    }
}
