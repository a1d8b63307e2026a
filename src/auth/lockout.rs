//! PIN Lockout Guard
//!
//! Per-session attempt counter with a cool-down. Expiry is evaluated lazily
//! whenever the state is inspected; there is no background timer.
//!
//! ```text
//!   Open --correct PIN--> Open (attempts = 0)
//!   Open --wrong PIN----> Open (attempts + 1) | Locked (attempts reached max)
//!   Locked --now < until--> Locked (nothing consumed)
//!   Locked --now >= until-> Open (attempts = 0)
//! ```

use chrono::{DateTime, Duration, Utc};

use crate::domain::Pin;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_LOCKOUT_SECONDS: i64 = 5 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    max_attempts: u32,
    cooldown: Duration,
}

impl LockoutPolicy {
    pub fn new(max_attempts: u32, cooldown_seconds: i64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            cooldown: Duration::seconds(cooldown_seconds.max(0)),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_LOCKOUT_SECONDS)
    }
}

/// Current position in the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Open { failed_attempts: u32 },
    Locked { remaining_seconds: u64 },
}

/// Outcome of one verification attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinCheck {
    Verified,
    /// Wrong PIN, session still open
    Rejected { attempts_remaining: u32 },
    /// Session is locked, either already or by this attempt
    LockedOut { remaining_seconds: u64 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinLockout {
    failed_attempts: u32,
    locked_until: Option<DateTime<Utc>>,
}

/// Whole seconds left, rounded up so a live lock never reports zero
fn seconds_until(until: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (until - now).num_milliseconds().max(0) as u64;
    (millis + 999) / 1000
}

impl PinLockout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn locked_until(&self) -> Option<DateTime<Utc>> {
        self.locked_until
    }

    /// Inspect the state, reopening an expired lock.
    pub fn state(&mut self, now: DateTime<Utc>) -> LockState {
        match self.locked_until {
            Some(until) if now < until => LockState::Locked {
                remaining_seconds: seconds_until(until, now),
            },
            Some(_) => {
                self.failed_attempts = 0;
                self.locked_until = None;
                LockState::Open { failed_attempts: 0 }
            }
            None => LockState::Open {
                failed_attempts: self.failed_attempts,
            },
        }
    }

    /// Compare a candidate PIN against the account's PIN.
    ///
    /// While locked nothing is compared and no attempt is consumed.
    pub fn verify(
        &mut self,
        policy: &LockoutPolicy,
        candidate: &Pin,
        expected: &Pin,
        now: DateTime<Utc>,
    ) -> PinCheck {
        if let LockState::Locked { remaining_seconds } = self.state(now) {
            return PinCheck::LockedOut { remaining_seconds };
        }

        if candidate == expected {
            self.failed_attempts = 0;
            return PinCheck::Verified;
        }

        self.failed_attempts += 1;
        if self.failed_attempts >= policy.max_attempts() {
            let until = now + policy.cooldown();
            self.locked_until = Some(until);
            tracing::warn!(
                attempts = self.failed_attempts,
                locked_until = %until,
                "PIN attempts exhausted, session locked"
            );
            return PinCheck::LockedOut {
                remaining_seconds: seconds_until(until, now),
            };
        }

        PinCheck::Rejected {
            attempts_remaining: policy.max_attempts() - self.failed_attempts,
        }
    }
}
