//! Reward Engine
//!
//! Cashback lottery for completed transfers and merchant loyalty discounts
//! derived from the ledger.

mod cashback;
pub mod loyalty;
mod random;

pub use cashback::{CashbackPolicy, DEFAULT_REWARD_PROBABILITY};
pub use loyalty::{customer_rewards, discount_for, merchant_rewards, MerchantRewards};
pub use random::{FixedRandom, RandomSource, ThreadRandom};
