//! Sessions
//!
//! A session is opened at login and carries the principal's PIN lockout
//! state. The lockout sits behind its own mutex, so concurrent PIN attempts in
//! one session are counted one at a time while other sessions proceed freely.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, RwLock};
use uuid::Uuid;

use super::PinLockout;

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    account_id: String,
    lockout: Mutex<PinLockout>,
}

impl Session {
    fn new(account_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            lockout: Mutex::new(PinLockout::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The logged-in account
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Exclusive access to the lockout state for one verification attempt
    pub async fn lockout(&self) -> MutexGuard<'_, PinLockout> {
        self.lockout.lock().await
    }
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh session with an empty lockout record
    pub async fn open(&self, account_id: impl Into<String>) -> Arc<Session> {
        let session = Arc::new(Session::new(account_id.into()));
        self.sessions
            .write()
            .await
            .insert(session.id(), session.clone());
        session
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Session>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Close a session, discarding its lockout state
    pub async fn close(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
