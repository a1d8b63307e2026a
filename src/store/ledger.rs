//! Transaction Ledger
//!
//! Append-only history of completed transfers. Appends are linearized by the
//! ledger's own write lock and are durable before they become visible to a
//! successful caller: an entry whose snapshot write fails is dropped again.

use std::collections::HashSet;
use std::path::PathBuf;

use tokio::sync::RwLock;

use crate::aggregate::Transaction;
use crate::domain::{generate_id, IdKind};

use super::{SnapshotFile, StoreError};

#[derive(Debug)]
pub struct Ledger {
    entries: RwLock<Vec<Transaction>>,
    snapshot: Option<SnapshotFile<Transaction>>,
}

impl Ledger {
    /// Ledger without persistence
    pub fn in_memory() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            snapshot: None,
        }
    }

    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let snapshot = SnapshotFile::<Transaction>::new(path);
        let entries = snapshot.load().await?;

        let mut seen = HashSet::with_capacity(entries.len());
        for tx in &entries {
            if !seen.insert(tx.id.as_str()) {
                return Err(StoreError::DuplicateRecord(tx.id.clone()));
            }
        }

        tracing::info!(
            path = %snapshot.path().display(),
            transactions = entries.len(),
            "Ledger loaded"
        );

        Ok(Self {
            entries: RwLock::new(entries),
            snapshot: Some(snapshot),
        })
    }

    /// Append a transaction built around a freshly generated, unused id.
    pub async fn append<F>(&self, build: F) -> Result<Transaction, StoreError>
    where
        F: FnOnce(String) -> Transaction,
    {
        let mut entries = self.entries.write().await;

        let id = generate_id(IdKind::Transaction, &mut rand::thread_rng(), |id| {
            entries.iter().any(|tx| tx.id == id)
        });
        let tx = build(id);
        entries.push(tx.clone());

        if let Some(snapshot) = &self.snapshot {
            if let Err(e) = snapshot.save(&entries).await {
                entries.pop();
                return Err(e);
            }
        }

        Ok(tx)
    }

    /// Compensating removal of an entry whose transfer could not be committed.
    pub(crate) async fn retract(&self, id: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;

        let Some(position) = entries.iter().rposition(|tx| tx.id == id) else {
            return Ok(());
        };
        let removed = entries.remove(position);

        if let Some(snapshot) = &self.snapshot {
            if let Err(e) = snapshot.save(&entries).await {
                entries.insert(position, removed);
                return Err(e);
            }
        }

        tracing::warn!(transaction_id = id, "Ledger entry retracted");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Option<Transaction> {
        self.entries.read().await.iter().find(|tx| tx.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Every transaction in append order
    pub async fn all(&self) -> Vec<Transaction> {
        self.entries.read().await.clone()
    }

    /// Transactions matching a predicate, in append order
    pub async fn filtered<P>(&self, predicate: P) -> Vec<Transaction>
    where
        P: Fn(&Transaction) -> bool,
    {
        self.entries
            .read()
            .await
            .iter()
            .filter(|tx| predicate(tx))
            .cloned()
            .collect()
    }

    /// Transactions sent or received by an account, most recent first.
    /// Entries with equal timestamps keep reverse append order.
    pub async fn statement(&self, account_id: &str) -> Vec<Transaction> {
        let mut statement: Vec<Transaction> = self
            .entries
            .read()
            .await
            .iter()
            .rev()
            .filter(|tx| tx.involves(account_id))
            .cloned()
            .collect();
        statement.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        statement
    }
}
