// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-key async locks serializing read-then-write sequences on one
/// aggregate within this process.
///
/// Holds no data; the guard only marks that the caller owns the key until it
/// is dropped. Other processes writing to the same store are not excluded.
pub struct ClaimLocks<K> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K> ClaimLocks<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self { locks: DashMap::new() }
    }

    pub async fn acquire(&self, key: &K) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the map shard is released before awaiting
        let lock = self.locks.entry(key.clone()).or_default().clone();
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K> Default for ClaimLocks<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
