//! Spending Summary
//!
//! Income, expense and cashback totals for one account, plus the outgoing
//! spend broken down by counterparty and by payee kind.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::aggregate::Transaction;
use crate::domain::{is_merchant_id, Balance};

/// Kind of payee an outgoing transfer went to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendingCategory {
    Merchant,
    Personal,
}

impl SpendingCategory {
    fn of(receiver_id: &str) -> Self {
        if is_merchant_id(receiver_id) {
            SpendingCategory::Merchant
        } else {
            SpendingCategory::Personal
        }
    }
}

/// Outgoing totals for one receiver
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CounterpartySpend {
    pub account_id: String,
    pub display_name: String,
    pub category: SpendingCategory,
    pub transfers: u64,
    pub spent: Decimal,
    pub cashback: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingSummary {
    pub account_id: String,
    pub current_balance: Decimal,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub total_cashback: Decimal,
    /// Outgoing spend per category
    pub by_category: BTreeMap<SpendingCategory, Decimal>,
    /// Largest spend first
    pub counterparties: Vec<CounterpartySpend>,
}

impl SpendingSummary {
    /// Fold an account's transactions into totals.
    ///
    /// Transactions that do not involve the account are ignored.
    pub fn build(account_id: &str, balance: &Balance, transactions: &[Transaction]) -> Self {
        let mut summary = Self {
            account_id: account_id.to_string(),
            current_balance: balance.value(),
            total_income: Decimal::ZERO,
            total_expense: Decimal::ZERO,
            total_cashback: Decimal::ZERO,
            by_category: BTreeMap::new(),
            counterparties: Vec::new(),
        };
        let mut counterparties: BTreeMap<&str, CounterpartySpend> = BTreeMap::new();

        for tx in transactions {
            if tx.receiver_id == account_id {
                summary.total_income += tx.amount.value();
            }
            if tx.sender_id != account_id {
                continue;
            }

            let amount = tx.amount.value();
            let category = SpendingCategory::of(&tx.receiver_id);
            summary.total_expense += amount;
            summary.total_cashback += tx.reward_amount;
            *summary.by_category.entry(category).or_insert(Decimal::ZERO) += amount;

            let entry = counterparties
                .entry(tx.receiver_id.as_str())
                .or_insert_with(|| CounterpartySpend {
                    account_id: tx.receiver_id.clone(),
                    display_name: tx.receiver_display_name.clone(),
                    category,
                    transfers: 0,
                    spent: Decimal::ZERO,
                    cashback: Decimal::ZERO,
                });
            entry.transfers += 1;
            entry.spent += amount;
            entry.cashback += tx.reward_amount;
        }

        summary.counterparties = counterparties.into_values().collect();
        summary
            .counterparties
            .sort_by(|a, b| b.spent.cmp(&a.spent));
        summary
    }
}
