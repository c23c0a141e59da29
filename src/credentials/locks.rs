//! Per-client mutual exclusion for grant read-modify-write sequences.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockTable = DashMap<String, Arc<Mutex<()>>>;

/// One async mutex per client reference.
///
/// Callback completion, credential refresh and disconnect for the same client
/// hold this lock across their load/modify/store steps, including the provider
/// round-trip in between. Different clients never share a lock.
///
/// Entries only live while someone holds or waits for them, so arbitrary
/// client refs from public routes do not accumulate.
#[derive(Default)]
pub struct ClientLocks {
    locks: Arc<LockTable>,
}

/// Held lock for one client. Dropping it releases the lock and, when nobody
/// else is waiting, removes the client's entry.
pub struct ClientLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    client_ref: String,
    locks: Arc<LockTable>,
}

impl Drop for ClientLockGuard {
    fn drop(&mut self) {
        // Release first so our Arc no longer counts
        drop(self.guard.take());

        // Waiters hold their own clone of the Arc, keeping the entry alive
        self.locks
            .remove_if(&self.client_ref, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl ClientLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and returns the lock guard for `client_ref`.
    pub async fn acquire(&self, client_ref: &str) -> ClientLockGuard {
        // Clone the Arc out so no DashMap shard guard is held across the await
        let lock = self
            .locks
            .entry(client_ref.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = lock.lock_owned().await;

        ClientLockGuard {
            guard: Some(guard),
            client_ref: client_ref.to_string(),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of clients currently holding or waiting for a lock.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
