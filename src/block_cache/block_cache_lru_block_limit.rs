use std::sync::Arc;

use moka::{
    policy::EvictionPolicy,
    sync::{Cache, CacheBuilder},
};

use crate::block::BlockKey;

use super::{BlockCache, CacheEntry};

/// A block cache with a fixed block capacity.
///
/// Pending entries count towards the capacity.
pub struct BlockCacheLruBlockLimit {
    cache: Cache<BlockKey, Arc<CacheEntry>>,
}

impl BlockCacheLruBlockLimit {
    /// Create a new [`BlockCacheLruBlockLimit`] with a capacity in blocks of `block_capacity`.
    #[must_use]
    pub fn new(block_capacity: u64) -> Self {
        let cache = CacheBuilder::new(block_capacity)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self { cache }
    }
}

impl BlockCache for BlockCacheLruBlockLimit {
    fn get(&self, key: &BlockKey) -> Option<Arc<CacheEntry>> {
        self.cache.get(key)
    }

    fn get_or_insert(&self, key: &BlockKey) -> Arc<CacheEntry> {
        self.cache
            .get_with_by_ref(key, || Arc::new(CacheEntry::new(key.clone())))
    }

    fn remove(&self, key: &BlockKey) {
        self.cache.invalidate(key);
    }

    fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
    }

    fn len(&self) -> usize {
        self.cache.run_pending_tasks();
        usize::try_from(self.cache.entry_count()).unwrap_or(usize::MAX)
    }
}
