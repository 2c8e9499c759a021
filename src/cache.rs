use crate::models::{CacheEntry, DimensionKey};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Memoized orderings per dimension key, voided wholesale by bumping a
/// global epoch (catalog change or day rollover). Reads are concurrent;
/// writes and invalidation are serialized behind the write lock so no
/// caller observes entries from a previous epoch after the bump.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: RwLock<HashMap<DimensionKey, CacheEntry>>,
    epoch: AtomicU64,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    pub fn get(&self, key: &DimensionKey) -> Option<Vec<String>> {
        let current = self.epoch();
        let entries = self.entries.read().expect("result cache read lock");
        entries
            .get(key)
            .filter(|entry| entry.epoch == current)
            .map(|entry| entry.ordered_ids.clone())
    }

    /// Stores an ordering computed under `epoch`. A result computed
    /// before an invalidation raced in is dropped rather than stored.
    pub fn put(&self, key: DimensionKey, ordered_ids: Vec<String>, epoch: u64) {
        let mut entries = self.entries.write().expect("result cache write lock");
        if epoch != self.epoch() {
            tracing::debug!(?key, epoch, "dropping result computed under a stale epoch");
            return;
        }
        entries.insert(key, CacheEntry { ordered_ids, epoch });
    }

    /// Bumps the epoch and clears the map. Returns the new epoch.
    pub fn invalidate(&self) -> u64 {
        let mut entries = self.entries.write().expect("result cache write lock");
        entries.clear();
        let next = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(epoch = next, "result cache invalidated");
        next
    }

    pub fn entry_count(&self) -> usize {
        self.entries.read().expect("result cache read lock").len()
    }
}
