//! Block caches: concurrent maps from [`BlockKey`] to [`CacheEntry`].
//!
//! A cache entry is created the first time a block is requested and holds a pending placeholder until the block is loaded.
//! [`BlockCacheUnbounded`] never evicts individual entries; memory is released only by clearing the whole cache.
//! [`BlockCacheLruBlockLimit`] and [`BlockCacheLruSizeLimit`] bound memory with least recently used eviction.

mod block_cache_lru_block_limit;
mod block_cache_lru_size_limit;
mod block_cache_unbounded;
mod cache_entry;

use std::sync::Arc;

pub use block_cache_lru_block_limit::BlockCacheLruBlockLimit;
pub use block_cache_lru_size_limit::BlockCacheLruSizeLimit;
pub use block_cache_unbounded::BlockCacheUnbounded;
pub use cache_entry::{CacheEntry, EntryClaim};

use crate::block::BlockKey;

/// Traits for a block cache.
pub trait BlockCache: Send + Sync {
    /// Retrieve the entry of a block. Returns [`None`] if the block has no entry.
    ///
    /// The cache implementation may modify the cache (e.g. update LRU cache) on retrieval.
    fn get(&self, key: &BlockKey) -> Option<Arc<CacheEntry>>;

    /// Retrieve the entry of a block, atomically inserting a new pending entry if it has none.
    ///
    /// Concurrent calls for the same key return the same entry.
    fn get_or_insert(&self, key: &BlockKey) -> Arc<CacheEntry>;

    /// Notify the cache that `entry` now holds decoded data.
    ///
    /// Size-aware caches use this to re-weigh the entry.
    fn entry_loaded(&self, _entry: &Arc<CacheEntry>) {}

    /// Remove the entry of a block.
    fn remove(&self, key: &BlockKey);

    /// Remove every entry.
    fn clear(&self);

    /// Return the number of entries in the cache.
    #[must_use]
    fn len(&self) -> usize;

    /// Returns true if the cache is empty.
    #[must_use]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use crate::{block::DataBlock, data_type::DataType};

    use super::*;

    fn block_cache_behaviour(cache: &dyn BlockCache) {
        let key0 = BlockKey::new(0, 0, 0, vec![0, 0]);
        let key1 = BlockKey::new(0, 0, 0, vec![0, 1]);
        assert!(cache.is_empty());
        assert!(cache.get(&key0).is_none());

        let entry = cache.get_or_insert(&key0);
        assert!(Arc::ptr_eq(&entry, &cache.get_or_insert(&key0)));
        assert!(entry.valid_block().is_none());
        assert_eq!(cache.len(), 1);

        entry.complete(Arc::new(DataBlock::zeros(DataType::UInt8, 4)));
        cache.entry_loaded(&entry);
        assert!(cache.get(&key0).unwrap().valid_block().is_some());

        cache.get_or_insert(&key1);
        assert_eq!(cache.len(), 2);
        cache.remove(&key1);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&key0).is_none());
    }

    #[test]
    fn block_cache_unbounded() {
        block_cache_behaviour(&BlockCacheUnbounded::new());
    }

    #[test]
    fn block_cache_lru_block_limit() {
        block_cache_behaviour(&BlockCacheLruBlockLimit::new(16));
    }

    #[test]
    fn block_cache_lru_size_limit() {
        block_cache_behaviour(&BlockCacheLruSizeLimit::new(1024));
    }
}
