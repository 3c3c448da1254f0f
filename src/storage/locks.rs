//! Pessimistic per-partition write locks.

use std::{
    collections::{BTreeSet, HashSet},
    sync::{Condvar, Mutex, PoisonError},
};

use crate::domain::PartitionKey;

use super::StoreError;

/// Registry of partitions currently held by a writer.
///
/// A caller acquires every key it needs in one step; keys are granted all at
/// once or not at all, so two multi-partition writers never deadlock.
/// Acquisition is not reentrant.
#[derive(Debug, Default)]
pub struct PartitionLocks {
    held: Mutex<HashSet<PartitionKey>>,
    released: Condvar,
}

impl PartitionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until every key in `keys` is free, then claims them.
    pub fn acquire(&self, keys: &[PartitionKey]) -> Result<PartitionGuard<'_>, StoreError> {
        let keys: Vec<PartitionKey> = keys
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut held = self
            .held
            .lock()
            .map_err(|err| StoreError::Poisoned(err.to_string()))?;
        while keys.iter().any(|key| held.contains(key)) {
            held = self
                .released
                .wait(held)
                .map_err(|err| StoreError::Poisoned(err.to_string()))?;
        }
        for key in &keys {
            held.insert(key.clone());
        }
        tracing::trace!(count = keys.len(), "partition locks acquired");
        Ok(PartitionGuard { locks: self, keys })
    }

    pub fn is_locked(&self, key: &PartitionKey) -> bool {
        self.held
            .lock()
            .map(|held| held.contains(key))
            .unwrap_or(false)
    }
}

/// Releases its partitions when dropped.
#[derive(Debug)]
pub struct PartitionGuard<'a> {
    locks: &'a PartitionLocks,
    keys: Vec<PartitionKey>,
}

impl PartitionGuard<'_> {
    pub fn keys(&self) -> &[PartitionKey] {
        &self.keys
    }
}

impl Drop for PartitionGuard<'_> {
    fn drop(&mut self) {
        let mut held = self
            .locks
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for key in &self.keys {
            held.remove(key);
        }
        drop(held);
        self.locks.released.notify_all();
    }
}
