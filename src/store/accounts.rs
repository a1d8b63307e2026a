//! Account Store
//!
//! In-memory repository of every account behind a single `RwLock`. The write
//! lock is the global serialization point for balance mutations: transfers
//! hold it for the whole debit/credit/append/flush unit, so two transfers
//! crossing the same pair of accounts can neither deadlock nor lose updates.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Utc;
use tokio::sync::{RwLock, RwLockWriteGuard};

use crate::aggregate::{Account, AccountRole, NewAccount};
use crate::domain::{generate_id, Balance, DomainError, IdKind};
use crate::error::AppError;

use super::{SnapshotFile, StoreError};

/// A stored face template together with the account it belongs to
#[derive(Debug, Clone)]
pub struct EnrolledTemplate {
    pub account_id: String,
    pub template: Vec<f32>,
}

#[derive(Debug)]
pub struct AccountStore {
    accounts: RwLock<BTreeMap<String, Account>>,
    snapshot: Option<SnapshotFile<Account>>,
}

impl AccountStore {
    /// Store without persistence
    pub fn in_memory() -> Self {
        Self {
            accounts: RwLock::new(BTreeMap::new()),
            snapshot: None,
        }
    }

    /// Load the store from a snapshot file, creating nothing on disk until
    /// the first mutation.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let snapshot = SnapshotFile::<Account>::new(path);
        let mut accounts = BTreeMap::new();

        for account in snapshot.load().await? {
            let id = account.id().to_string();
            if accounts.insert(id.clone(), account).is_some() {
                return Err(StoreError::DuplicateRecord(id));
            }
        }

        tracing::info!(
            path = %snapshot.path().display(),
            accounts = accounts.len(),
            "Account store loaded"
        );

        Ok(Self {
            accounts: RwLock::new(accounts),
            snapshot: Some(snapshot),
        })
    }

    pub async fn get(&self, id: &str) -> Option<Account> {
        self.accounts.read().await.get(id).cloned()
    }

    pub async fn get_balance(&self, id: &str) -> Option<Balance> {
        self.accounts.read().await.get(id).map(|a| *a.balance())
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }

    /// Open a new account with a freshly generated identifier.
    ///
    /// Fails with `DuplicateIdentifier` when the email or phone is already
    /// registered. Nothing is kept if the snapshot cannot be written.
    pub async fn create(&self, draft: NewAccount) -> Result<Account, AppError> {
        draft.validate()?;

        let mut accounts = self.write().await;

        let email = draft.email.trim();
        let phone = draft.phone.trim();
        for existing in accounts.iter() {
            if existing.email().eq_ignore_ascii_case(email) {
                return Err(DomainError::duplicate("email", email).into());
            }
            if existing.phone() == phone {
                return Err(DomainError::duplicate("phone", phone).into());
            }
        }

        let kind = match draft.role {
            AccountRole::Personal => IdKind::Personal,
            AccountRole::Merchant => IdKind::Merchant,
        };
        let id = generate_id(kind, &mut rand::thread_rng(), |id| accounts.contains(id));

        let account = Account::create(id, draft, Utc::now());
        accounts.insert(account.clone())?;

        if let Err(e) = accounts.flush().await {
            accounts.remove(account.id());
            return Err(e.into());
        }

        Ok(account)
    }

    /// Atomic read-modify-write of one account.
    ///
    /// The mutator works on a copy; the copy replaces the stored account only
    /// if the mutator succeeds and the snapshot is written.
    pub async fn update<F, R>(&self, id: &str, mutator: F) -> Result<(Account, R), AppError>
    where
        F: FnOnce(&mut Account) -> Result<R, DomainError>,
    {
        let mut accounts = self.write().await;

        let original = accounts
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::AccountNotFound(id.to_string()))?;

        let mut updated = original.clone();
        let output = mutator(&mut updated)?;
        accounts.replace(updated.clone());

        if let Err(e) = accounts.flush().await {
            accounts.replace(original);
            return Err(e.into());
        }

        Ok((updated, output))
    }

    /// Copy every enrolled face template.
    ///
    /// The read lock is released before the caller starts scoring, so a slow
    /// scan never blocks transfers.
    pub async fn enrolled_templates(&self) -> Vec<EnrolledTemplate> {
        self.accounts
            .read()
            .await
            .values()
            .filter_map(|account| {
                account.biometric_template().map(|t| EnrolledTemplate {
                    account_id: account.id().to_string(),
                    template: t.to_vec(),
                })
            })
            .collect()
    }

    /// Take the global write lock.
    pub async fn write(&self) -> AccountsWriteGuard<'_> {
        AccountsWriteGuard {
            accounts: self.accounts.write().await,
            snapshot: self.snapshot.as_ref(),
        }
    }
}

/// Exclusive access to every account, held for the duration of one
/// multi-account mutation.
pub struct AccountsWriteGuard<'a> {
    accounts: RwLockWriteGuard<'a, BTreeMap<String, Account>>,
    snapshot: Option<&'a SnapshotFile<Account>>,
}

impl AccountsWriteGuard<'_> {
    pub fn get(&self, id: &str) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.accounts.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Insert a brand-new account, refusing to overwrite an existing id
    pub fn insert(&mut self, account: Account) -> Result<(), DomainError> {
        if self.accounts.contains_key(account.id()) {
            return Err(DomainError::duplicate("account id", account.id()));
        }
        self.accounts.insert(account.id().to_string(), account);
        Ok(())
    }

    /// Overwrite an account with a new version of itself
    pub fn replace(&mut self, account: Account) {
        self.accounts.insert(account.id().to_string(), account);
    }

    fn remove(&mut self, id: &str) -> Option<Account> {
        self.accounts.remove(id)
    }

    /// Write every account to the snapshot file, if the store has one
    pub async fn flush(&self) -> Result<(), StoreError> {
        match self.snapshot {
            Some(snapshot) => {
                let records: Vec<Account> = self.accounts.values().cloned().collect();
                snapshot.save(&records).await
            }
            None => Ok(()),
        }
    }
}
