//! Per-key refresh locks

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{RankingError, Result};

/// At most one refresh per key; a second caller is turned away rather than queued
#[derive(Debug, Default)]
pub struct RefreshLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl RefreshLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock for `key`, held until the returned guard is dropped
    pub fn try_acquire(&self, key: &str) -> Result<OwnedMutexGuard<()>> {
        let lock = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.try_lock_owned().map_err(|_| RankingError::RefreshInProgress(key.to_string()))
    }

    pub fn is_locked(&self, key: &str) -> bool {
        self.locks.get(key).map(|lock| lock.try_lock().is_err()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected() {
        let locks = RefreshLocks::new();
        let guard = locks.try_acquire("1qb_dynasty_no_tep").unwrap();
        assert!(locks.is_locked("1qb_dynasty_no_tep"));
        assert!(matches!(
            locks.try_acquire("1qb_dynasty_no_tep"),
            Err(RankingError::RefreshInProgress(_))
        ));
        // Other keys are independent
        assert!(locks.try_acquire("superflex_dynasty_no_tep").is_ok());

        drop(guard);
        assert!(locks.try_acquire("1qb_dynasty_no_tep").is_ok());
    }
}
