//! Per-account mutual exclusion for balance read-modify-write sequences.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = Arc<Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>>;

/// Hands out one async mutex per account id.
///
/// An entry lives only while some caller holds or waits for it, so ids that
/// never turn out to exist do not accumulate.
#[derive(Clone, Default)]
pub struct AccountLocks {
    locks: LockTable,
}

/// Holds the locks of every account involved until dropped
pub struct AccountGuard {
    guards: Vec<OwnedMutexGuard<()>>,
    account_ids: Vec<i64>,
    locks: LockTable,
}

fn table(locks: &LockTable) -> MutexGuard<'_, HashMap<i64, Arc<AsyncMutex<()>>>> {
    // Entries are plain Arcs, so a poisoned lock still holds a usable map.
    locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, account_id: i64) -> Arc<AsyncMutex<()>> {
        table(&self.locks).entry(account_id).or_default().clone()
    }

    /// Lock every listed account, always in ascending id order so two
    /// transfers in opposite directions cannot deadlock.
    pub async fn lock_accounts(&self, account_ids: &[i64]) -> AccountGuard {
        let mut ids = account_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut guard = AccountGuard {
            guards: Vec::with_capacity(ids.len()),
            account_ids: ids.clone(),
            locks: self.locks.clone(),
        };
        for id in ids {
            guard.guards.push(self.lock_for(id).lock_owned().await);
        }

        guard
    }

    #[cfg(test)]
    fn tracked_accounts(&self) -> usize {
        table(&self.locks).len()
    }
}

impl Drop for AccountGuard {
    fn drop(&mut self) {
        self.guards.clear();

        // Clones are only taken under the table lock, so a count of one means
        // nobody else holds or waits for this entry.
        let mut locks = table(&self.locks);
        for id in &self.account_ids {
            if locks.get(id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
                locks.remove(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_account_is_exclusive() {
        let locks = AccountLocks::new();
        let guard = locks.lock_accounts(&[1, 2]).await;

        let contender = locks.clone();
        let blocked = tokio::spawn(async move {
            let _guard = contender.lock_accounts(&[2, 3]).await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!blocked.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), blocked)
            .await
            .expect("lock should be released")
            .unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_ids_do_not_self_deadlock() {
        let locks = AccountLocks::new();
        let guard = tokio::time::timeout(Duration::from_secs(1), locks.lock_accounts(&[4, 4])).await;
        assert!(guard.is_ok());
    }

    #[tokio::test]
    async fn test_disjoint_accounts_do_not_block() {
        let locks = AccountLocks::new();
        let _first = locks.lock_accounts(&[1, 2]).await;
        let second = tokio::time::timeout(Duration::from_secs(1), locks.lock_accounts(&[3, 4])).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_released_locks_are_pruned() {
        let locks = AccountLocks::new();

        for i in 0..1_000 {
            let _guard = locks.lock_accounts(&[1, 1_000_000 + i]).await;
            assert_eq!(locks.tracked_accounts(), 2);
        }

        assert_eq!(locks.tracked_accounts(), 0);
    }

    #[tokio::test]
    async fn test_waiting_caller_keeps_its_entry() {
        let locks = AccountLocks::new();
        let guard = locks.lock_accounts(&[7]).await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _guard = contender.lock_accounts(&[7]).await;
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        drop(guard);
        assert_eq!(locks.tracked_accounts(), 1);

        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .expect("waiting caller should get the lock")
            .unwrap();
        assert_eq!(locks.tracked_accounts(), 0);
    }
}
