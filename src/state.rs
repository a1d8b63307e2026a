//! Shared application state
//!
//! One instance per process, cloned cheaply into every handler.

use std::sync::Arc;

use crate::auth::{BiometricMatcher, LockoutPolicy, SessionRegistry};
use crate::config::Config;
use crate::rewards::{CashbackPolicy, RandomSource, ThreadRandom};
use crate::store::{AccountStore, Ledger, StoreError};

#[derive(Debug, Clone)]
pub struct AppState {
    pub accounts: Arc<AccountStore>,
    pub ledger: Arc<Ledger>,
    pub sessions: Arc<SessionRegistry>,
    pub rng: Arc<dyn RandomSource>,
    pub cashback: CashbackPolicy,
    pub lockout: LockoutPolicy,
    pub matcher: BiometricMatcher,
}

impl AppState {
    /// Build the state described by the configuration, loading both
    /// snapshots when a data directory is set.
    pub async fn open(config: &Config) -> Result<Self, StoreError> {
        let (accounts, ledger) = match (config.accounts_path(), config.transactions_path()) {
            (Some(accounts_path), Some(transactions_path)) => {
                if let Some(dir) = &config.data_dir {
                    tokio::fs::create_dir_all(dir)
                        .await
                        .map_err(|e| StoreError::io(dir, e))?;
                }
                (
                    AccountStore::open(accounts_path).await?,
                    Ledger::open(transactions_path).await?,
                )
            }
            _ => {
                tracing::warn!("DATA_DIR not set, state will not survive a restart");
                (AccountStore::in_memory(), Ledger::in_memory())
            }
        };

        Ok(Self::from_parts(accounts, ledger).with_config(config))
    }

    /// Fresh state with default policies and nothing persisted
    pub fn in_memory() -> Self {
        Self::from_parts(AccountStore::in_memory(), Ledger::in_memory())
    }

    pub fn from_parts(accounts: AccountStore, ledger: Ledger) -> Self {
        Self {
            accounts: Arc::new(accounts),
            ledger: Arc::new(ledger),
            sessions: Arc::new(SessionRegistry::new()),
            rng: Arc::new(ThreadRandom),
            cashback: CashbackPolicy::default(),
            lockout: LockoutPolicy::default(),
            matcher: BiometricMatcher::default(),
        }
    }

    /// Apply the tunable policies from the configuration
    pub fn with_config(mut self, config: &Config) -> Self {
        self.cashback = CashbackPolicy::new(config.reward_probability);
        self.lockout = LockoutPolicy::new(config.pin_max_attempts, config.pin_lockout_seconds);
        self.matcher = BiometricMatcher::new(config.face_match_threshold);
        self
    }

    /// Replace the random source used by the cashback lottery
    pub fn with_random(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Arc::new(rng);
        self
    }
}
