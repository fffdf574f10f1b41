use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

type SiteMutex = Arc<tokio::sync::Mutex<()>>;

/// Per-site mutual exclusion for crawls
///
/// Each site id maps to its own async mutex. A crawl holds the guard for its
/// whole duration, so crawls of one site are serialized in the order they
/// asked for the lock while crawls of different sites proceed in parallel.
/// Entries nobody holds or waits on are dropped the next time a lock is taken.
#[derive(Debug, Default)]
pub struct SiteLocks {
    locks: Mutex<HashMap<i64, SiteMutex>>,
}

/// Guard proving exclusive access to one site
#[derive(Debug)]
pub struct SiteGuard {
    _guard: OwnedMutexGuard<()>,
}

impl SiteLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other holder has `site_id`, then takes it
    pub async fn acquire(&self, site_id: i64) -> SiteGuard {
        let lock = self.lock_for(site_id);
        SiteGuard {
            _guard: lock.lock_owned().await,
        }
    }

    #[cfg(test)]
    fn try_acquire(&self, site_id: i64) -> Option<SiteGuard> {
        let lock = self.lock_for(site_id);
        lock.try_lock_owned().ok().map(|guard| SiteGuard { _guard: guard })
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().map(|m| m.len()).unwrap_or(0)
    }

    fn lock_for(&self, site_id: i64) -> SiteMutex {
        // A poisoned map still holds valid entries; keep using it
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());

        // Holders and waiters own a clone; a lone map reference is idle
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);

        locks
            .entry(site_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_site_is_exclusive() {
        let locks = SiteLocks::new();

        let guard = locks.acquire(1).await;
        assert!(locks.try_acquire(1).is_none());

        drop(guard);
        assert!(locks.try_acquire(1).is_some());
    }

    #[tokio::test]
    async fn test_different_sites_do_not_block() {
        let locks = SiteLocks::new();

        let _a = locks.acquire(1).await;
        let b = locks.try_acquire(2);
        assert!(b.is_some());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_idle_entries_are_pruned() {
        let locks = SiteLocks::new();

        let held = locks.acquire(1).await;
        drop(locks.acquire(2).await);
        drop(locks.acquire(3).await);

        // Taking another lock sweeps 2 and 3; 1 is still held
        let _other = locks.acquire(4).await;
        assert_eq!(locks.len(), 2);

        drop(held);
        let _again = locks.acquire(1).await;
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_waiter_proceeds_after_release() {
        let locks = Arc::new(SiteLocks::new());
        let guard = locks.acquire(7).await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _g = locks.acquire(7).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
