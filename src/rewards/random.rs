//! Random sources
//!
//! Every lottery draw goes through `RandomSource` so the reward branch can be
//! forced on or off.

use std::fmt;

use rand::Rng;

pub trait RandomSource: Send + Sync + fmt::Debug {
    /// Bernoulli trial: `true` with the given probability
    fn chance(&self, probability: f64) -> bool;

    /// Uniform integer in `[low, high]`
    fn between(&self, low: i64, high: i64) -> i64;
}

/// Production source backed by the thread-local generator
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn chance(&self, probability: f64) -> bool {
        rand::thread_rng().gen::<f64>() < probability
    }

    fn between(&self, low: i64, high: i64) -> i64 {
        if low >= high {
            return low;
        }
        rand::thread_rng().gen_range(low..=high)
    }
}

/// Deterministic source: every trial has the same outcome and every draw
/// returns the same value, clamped into the requested range.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom {
    hit: bool,
    value: i64,
}

impl FixedRandom {
    /// Every trial succeeds and draws yield `value`
    pub fn always(value: i64) -> Self {
        Self { hit: true, value }
    }

    /// Every trial fails; draws yield the low end of the range
    pub fn never() -> Self {
        Self {
            hit: false,
            value: i64::MIN,
        }
    }
}

impl RandomSource for FixedRandom {
    fn chance(&self, _probability: f64) -> bool {
        self.hit
    }

    fn between(&self, low: i64, high: i64) -> i64 {
        self.value.clamp(low, high.max(low))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_random_bounds() {
        let rng = ThreadRandom;
        for _ in 0..1_000 {
            let v = rng.between(100, 5000);
            assert!((100..=5000).contains(&v));
        }
        assert!(!rng.chance(0.0));
        assert!(rng.chance(1.0));
        assert_eq!(rng.between(7, 7), 7);
    }

    #[test]
    fn test_fixed_random() {
        assert!(FixedRandom::always(10).chance(0.0));
        assert!(!FixedRandom::never().chance(1.0));
        assert_eq!(FixedRandom::always(99_999).between(100, 5000), 5000);
        assert_eq!(FixedRandom::never().between(100, 5000), 100);
    }
}
