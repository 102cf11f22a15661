use std::sync::Arc;

use moka::{
    policy::EvictionPolicy,
    sync::{Cache, CacheBuilder},
};

use crate::block::BlockKey;

use super::{BlockCache, CacheEntry};

/// A block cache with a fixed size capacity in bytes of decoded data.
///
/// Pending entries have no weight until they are loaded.
pub struct BlockCacheLruSizeLimit {
    cache: Cache<BlockKey, Arc<CacheEntry>>,
}

impl BlockCacheLruSizeLimit {
    /// Create a new [`BlockCacheLruSizeLimit`] with a capacity in bytes of `capacity`.
    #[must_use]
    pub fn new(capacity: u64) -> Self {
        let cache = CacheBuilder::new(capacity)
            .eviction_policy(EvictionPolicy::lru())
            .weigher(|_k, v: &Arc<CacheEntry>| {
                u32::try_from(v.size_in_bytes()).unwrap_or(u32::MAX)
            })
            .build();
        Self { cache }
    }

    /// Return the size of the cache in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.cache.run_pending_tasks();
        usize::try_from(self.cache.weighted_size()).unwrap_or(usize::MAX)
    }
}

impl BlockCache for BlockCacheLruSizeLimit {
    fn get(&self, key: &BlockKey) -> Option<Arc<CacheEntry>> {
        self.cache.get(key)
    }

    fn get_or_insert(&self, key: &BlockKey) -> Arc<CacheEntry> {
        self.cache
            .get_with_by_ref(key, || Arc::new(CacheEntry::new(key.clone())))
    }

    fn entry_loaded(&self, entry: &Arc<CacheEntry>) {
        // Reinsert so the weigher sees the decoded size, unless the entry was evicted or replaced meanwhile
        if let Some(current) = self.cache.get(entry.key()) {
            if Arc::ptr_eq(&current, entry) {
                self.cache.insert(entry.key().clone(), entry.clone());
            }
        }
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
