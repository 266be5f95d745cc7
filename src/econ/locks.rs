//! Per-participant serialization of state-mutating operations.
//!
//! Every mutating command performs a read-validate-mutate-persist cycle, so
//! two overlapping invocations from one participant would race. The registry
//! hands out one async mutex per participant id; dispatch acquires it before
//! touching the store. Two-party operations (transfers) acquire both locks
//! in identifier order so opposite-direction transfers cannot deadlock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub struct LockRegistry {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, id: &str) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock().expect("lock registry poisoned");
        map.entry(id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Acquire the lock for a single participant.
    pub async fn lock(&self, id: &str) -> OwnedMutexGuard<()> {
        self.entry(id).lock_owned().await
    }

    /// Acquire locks for two distinct participants in identifier order.
    pub async fn lock_pair(
        &self,
        a: &str,
        b: &str,
    ) -> (OwnedMutexGuard<()>, OwnedMutexGuard<()>) {
        debug_assert_ne!(a, b, "lock_pair requires distinct participants");
        if a <= b {
            let first = self.entry(a).lock_owned().await;
            let second = self.entry(b).lock_owned().await;
            (first, second)
        } else {
            let second = self.entry(b).lock_owned().await;
            let first = self.entry(a).lock_owned().await;
            (first, second)
        }
    }

    /// Number of participants with a registered lock (registry entries are
    /// retained for the process lifetime; the population is one human-scale).
    pub fn registered(&self) -> usize {
        self.inner.lock().expect("lock registry poisoned").len()
    }
}
