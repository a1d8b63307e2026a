//! Per-transfer cashback lottery

use crate::domain::Amount;

use super::RandomSource;

/// Default probability that a transfer earns cashback
pub const DEFAULT_REWARD_PROBABILITY: f64 = 0.10;

/// Smallest cashback, in cents (1.00)
const MIN_REWARD_CENTS: i64 = 100;

/// Largest cashback, in cents (50.00)
const MAX_REWARD_CENTS: i64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashbackPolicy {
    probability: f64,
}

impl CashbackPolicy {
    pub fn new(probability: f64) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
        }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Run one lottery draw. A win yields an amount uniform in [1.00, 50.00].
    pub fn draw(&self, rng: &dyn RandomSource) -> Option<Amount> {
        if !rng.chance(self.probability) {
            return None;
        }

        let cents = rng.between(MIN_REWARD_CENTS, MAX_REWARD_CENTS);
        Amount::from_cents(cents).ok()
    }
}

impl Default for CashbackPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_REWARD_PROBABILITY)
    }
}
