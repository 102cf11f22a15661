use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use crate::block::BlockKey;

use super::{BlockCache, CacheEntry};

/// A block cache without a capacity.
///
/// Entries are only released by [`clear`](BlockCache::clear) or [`remove`](BlockCache::remove).
#[derive(Debug, Default)]
pub struct BlockCacheUnbounded {
    entries: RwLock<HashMap<BlockKey, Arc<CacheEntry>>>,
}

impl BlockCacheUnbounded {
    /// Create a new [`BlockCacheUnbounded`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockCache for BlockCacheUnbounded {
    fn get(&self, key: &BlockKey) -> Option<Arc<CacheEntry>> {
        self.entries.read().get(key).cloned()
    }

    fn get_or_insert(&self, key: &BlockKey) -> Arc<CacheEntry> {
        if let Some(entry) = self.get(key) {
            return entry;
        }
        self.entries
            .write()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(CacheEntry::new(key.clone())))
            .clone()
    }

    fn remove(&self, key: &BlockKey) {
        self.entries.write().remove(key);
    }

    fn clear(&self) {
        self.entries.write().clear();
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}
