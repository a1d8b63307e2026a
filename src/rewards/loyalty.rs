//! Merchant loyalty discounts
//!
//! Derived views over the ledger. Nothing here is stored: every call
//! aggregates the transactions it is given.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::Transaction;
use crate::domain::is_merchant_id;

/// Minimum transfer that counts toward a discount tier (50.00)
pub const QUALIFYING_AMOUNT: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Qualifying transfers needed per tier
pub const VISITS_PER_TIER: u64 = 5;

/// Discount unlocked per tier (25.00)
pub const DISCOUNT_PER_TIER: Decimal = Decimal::from_parts(25, 0, 0, false, 0);

/// Loyalty standing with one merchant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantRewards {
    pub merchant_id: String,
    pub merchant_name: String,
    pub visit_count: u64,
    pub total_spent: Decimal,
    pub qualifying_count: u64,
    pub discount: Decimal,
}

impl MerchantRewards {
    fn empty(merchant_id: &str, merchant_name: &str) -> Self {
        Self {
            merchant_id: merchant_id.to_string(),
            merchant_name: merchant_name.to_string(),
            visit_count: 0,
            total_spent: Decimal::ZERO,
            qualifying_count: 0,
            discount: Decimal::ZERO,
        }
    }

    fn record(&mut self, tx: &Transaction) {
        self.visit_count += 1;
        self.total_spent += tx.amount.value();
        if tx.amount.value() >= QUALIFYING_AMOUNT {
            self.qualifying_count += 1;
        }
        self.discount = discount_for(self.qualifying_count);
    }
}

/// `floor(qualifying / 5) * 25`
pub fn discount_for(qualifying_count: u64) -> Decimal {
    Decimal::from(qualifying_count / VISITS_PER_TIER) * DISCOUNT_PER_TIER
}

/// Loyalty totals for every transfer a merchant has received
pub fn merchant_rewards(
    merchant_id: &str,
    merchant_name: &str,
    transactions: &[Transaction],
) -> MerchantRewards {
    transactions
        .iter()
        .filter(|tx| tx.receiver_id == merchant_id)
        .fold(MerchantRewards::empty(merchant_id, merchant_name), |mut acc, tx| {
            acc.record(tx);
            acc
        })
}

/// Loyalty standing of one customer with each merchant they have paid,
/// most visited first.
pub fn customer_rewards(customer_id: &str, transactions: &[Transaction]) -> Vec<MerchantRewards> {
    let mut by_merchant: BTreeMap<&str, MerchantRewards> = BTreeMap::new();

    for tx in transactions
        .iter()
        .filter(|tx| tx.sender_id == customer_id && is_merchant_id(&tx.receiver_id))
    {
        by_merchant
            .entry(tx.receiver_id.as_str())
            .or_insert_with(|| MerchantRewards::empty(&tx.receiver_id, &tx.receiver_display_name))
            .record(tx);
    }

    let mut rewards: Vec<MerchantRewards> = by_merchant.into_values().collect();
    rewards.sort_by(|a, b| b.visit_count.cmp(&a.visit_count));
    rewards
}
