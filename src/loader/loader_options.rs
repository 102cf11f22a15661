use crate::config::global_config;

/// The capacity of the block cache of a [`BlockLoader`](super::BlockLoader).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CacheCapacity {
    /// Blocks are only released when the cache is cleared or the loader is closed.
    #[default]
    Unbounded,
    /// At most this many blocks are cached, evicting the least recently used.
    Blocks(u64),
    /// At most this many bytes of decoded data are cached, evicting the least recently used.
    Bytes(u64),
}

/// Options of a [`BlockLoader`](super::BlockLoader).
///
/// Defaults are taken from the [global configuration](crate::config::Config).
#[derive(Debug, Clone)]
pub struct BlockLoaderOptions {
    fetcher_threads: usize,
    fetch_queue_capacity: usize,
    cache_failed_blocks: bool,
    cache_capacity: CacheCapacity,
}

impl Default for BlockLoaderOptions {
    fn default() -> Self {
        BlockLoaderOptionsBuilder::new().build()
    }
}

impl BlockLoaderOptions {
    /// Create a new block loader options builder.
    #[must_use]
    pub fn builder() -> BlockLoaderOptionsBuilder {
        BlockLoaderOptionsBuilder::new()
    }

    /// Return the number of fetcher threads.
    #[must_use]
    pub fn fetcher_threads(&self) -> usize {
        self.fetcher_threads
    }

    /// Set the number of fetcher threads.
    ///
    /// With zero threads nothing is loaded in the background: budgeted accesses stay pending until a blocking access loads the block.
    pub fn set_fetcher_threads(&mut self, fetcher_threads: usize) {
        self.fetcher_threads = fetcher_threads;
    }

    /// Return the capacity of each fetch queue.
    #[must_use]
    pub fn fetch_queue_capacity(&self) -> usize {
        self.fetch_queue_capacity
    }

    /// Set the capacity of each fetch queue.
    pub fn set_fetch_queue_capacity(&mut self, fetch_queue_capacity: usize) {
        self.fetch_queue_capacity = fetch_queue_capacity;
    }

    /// Returns true if blocks that failed to load are cached.
    #[must_use]
    pub fn cache_failed_blocks(&self) -> bool {
        self.cache_failed_blocks
    }

    /// Set whether blocks that failed to load are cached.
    pub fn set_cache_failed_blocks(&mut self, cache_failed_blocks: bool) {
        self.cache_failed_blocks = cache_failed_blocks;
    }

    /// Return the cache capacity.
    #[must_use]
    pub fn cache_capacity(&self) -> CacheCapacity {
        self.cache_capacity
    }

    /// Set the cache capacity.
    pub fn set_cache_capacity(&mut self, cache_capacity: CacheCapacity) {
        self.cache_capacity = cache_capacity;
    }
}

/// Builder for [`BlockLoaderOptions`].
#[derive(Debug, Clone)]
pub struct BlockLoaderOptionsBuilder {
    fetcher_threads: usize,
    fetch_queue_capacity: usize,
    cache_failed_blocks: bool,
    cache_capacity: CacheCapacity,
}

impl Default for BlockLoaderOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockLoaderOptionsBuilder {
    /// Create a new block loader options builder.
    #[must_use]
    pub fn new() -> Self {
        let config = global_config();
        Self {
            fetcher_threads: config.fetcher_threads(),
            fetch_queue_capacity: config.fetch_queue_capacity(),
            cache_failed_blocks: config.cache_failed_blocks(),
            cache_capacity: CacheCapacity::default(),
        }
    }

    /// Build into block loader options.
    #[must_use]
    pub fn build(&self) -> BlockLoaderOptions {
        BlockLoaderOptions {
            fetcher_threads: self.fetcher_threads,
            fetch_queue_capacity: self.fetch_queue_capacity,
            cache_failed_blocks: self.cache_failed_blocks,
            cache_capacity: self.cache_capacity,
        }
    }

    /// Set the number of fetcher threads.
    ///
    /// See [`BlockLoaderOptions::set_fetcher_threads`].
    #[must_use]
    pub fn fetcher_threads(mut self, fetcher_threads: usize) -> Self {
        self.fetcher_threads = fetcher_threads;
        self
    }

    /// Set the capacity of each fetch queue.
    #[must_use]
    pub fn fetch_queue_capacity(mut self, fetch_queue_capacity: usize) -> Self {
        self.fetch_queue_capacity = fetch_queue_capacity;
        self
    }

    /// Set whether blocks that failed to load are cached.
    #[must_use]
    pub fn cache_failed_blocks(mut self, cache_failed_blocks: bool) -> Self {
        self.cache_failed_blocks = cache_failed_blocks;
        self
    }

    /// Set the cache capacity.
    #[must_use]
    pub fn cache_capacity(mut self, cache_capacity: CacheCapacity) -> Self {
        self.cache_capacity = cache_capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_loader_options_builder() {
        let options = BlockLoaderOptions::builder()
            .fetcher_threads(2)
            .fetch_queue_capacity(8)
            .cache_failed_blocks(false)
            .cache_capacity(CacheCapacity::Blocks(64))
            .build();
        assert_eq!(options.fetcher_threads(), 2);
        assert_eq!(options.fetch_queue_capacity(), 8);
        assert!(!options.cache_failed_blocks());
        assert_eq!(options.cache_capacity(), CacheCapacity::Blocks(64));
        assert_eq!(
            BlockLoaderOptions::default().cache_capacity(),
            CacheCapacity::Unbounded
        );
    }
}
