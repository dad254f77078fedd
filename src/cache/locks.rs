//! Striped merge locks.
//!
//! `merge` must not interleave its read-compare-write for the same key. A
//! fixed array of mutexes is indexed by a hash of `(namespace, key)`, so one
//! key always maps to the same stripe while unrelated keys rarely contend.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard};

/// Default number of stripes.
pub const DEFAULT_LOCK_STRIPES: usize = 64;

/// Fixed set of merge locks indexed by key hash.
#[derive(Debug)]
pub struct KeyLocks {
    stripes: Box<[Mutex<()>]>,
}

impl KeyLocks {
    /// Creates `stripes` locks. A count of zero is raised to one, which gives
    /// a single process-wide merge lock.
    pub fn new(stripes: usize) -> Self {
        let stripes = stripes.max(1);
        Self {
            stripes: (0..stripes).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Number of stripes.
    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }

    /// Stripe index for a namespace/key pair.
    pub fn stripe_for(&self, namespace: &str, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        namespace.hash(&mut hasher);
        key.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }

    /// Blocks until the stripe for `(namespace, key)` is held.
    pub fn lock(&self, namespace: &str, key: &str) -> MutexGuard<'_, ()> {
        let idx = self.stripe_for(namespace, key);
        // The guarded data is `()`, so a poisoned stripe carries no broken state.
        self.stripes[idx]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for KeyLocks {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_STRIPES)
    }
}
