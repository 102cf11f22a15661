//! `pyramid_cache` global configuration options.

use std::{num::NonZeroUsize, sync::OnceLock};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for the `pyramid_cache` crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
/// The options are defaults for [`BlockLoaderOptions`](crate::loader::BlockLoaderOptions) and are read when options are created.
///
/// ## Fetcher Threads
/// > default: [`std::thread::available_parallelism`]`()`
///
/// The number of background threads started when a [`BlockLoader`](crate::loader::BlockLoader) opens.
/// Each thread takes the highest priority pending block from the fetch queues and decodes it.
/// With zero threads, budgeted accesses are never loaded in the background.
///
/// ## Fetch Queue Capacity
/// > default: `4096`
///
/// The maximum number of pending fetch tasks per priority.
/// When a queue is full, the oldest task is dropped. Its block is re-enqueued on the next budgeted access.
///
/// ## Cache Failed Blocks
/// > default: [`true`]
///
/// If enabled, a block that failed to read or decode is cached as a zero-filled block like an absent block.
/// Otherwise, the zero-filled block is delivered to waiting callers but not cached, and the next access retries the read.
///
/// ## View Concurrent Target
/// > default: [`std::thread::available_parallelism`]`()`
///
/// The number of blocks a [`VirtualArrayView`](crate::view::VirtualArrayView) retrieves concurrently when reading a region.
#[derive(Debug, Clone)]
pub struct Config {
    fetcher_threads: usize,
    fetch_queue_capacity: usize,
    cache_failed_blocks: bool,
    view_concurrent_target: usize,
}

impl Default for Config {
    fn default() -> Self {
        let parallelism = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Config {
            fetcher_threads: parallelism,
            fetch_queue_capacity: 4096,
            cache_failed_blocks: true,
            view_concurrent_target: parallelism,
        }
    }
}

impl Config {
    /// Get the [fetcher threads](#fetcher-threads) configuration.
    #[must_use]
    pub fn fetcher_threads(&self) -> usize {
        self.fetcher_threads
    }

    /// Set the [fetcher threads](#fetcher-threads) configuration.
    pub fn set_fetcher_threads(&mut self, fetcher_threads: usize) {
        self.fetcher_threads = fetcher_threads;
    }

    /// Get the [fetch queue capacity](#fetch-queue-capacity) configuration.
    #[must_use]
    pub fn fetch_queue_capacity(&self) -> usize {
        self.fetch_queue_capacity
    }

    /// Set the [fetch queue capacity](#fetch-queue-capacity) configuration.
    pub fn set_fetch_queue_capacity(&mut self, fetch_queue_capacity: usize) {
        self.fetch_queue_capacity = fetch_queue_capacity;
    }

    /// Get the [cache failed blocks](#cache-failed-blocks) configuration.
    #[must_use]
    pub fn cache_failed_blocks(&self) -> bool {
        self.cache_failed_blocks
    }

    /// Set the [cache failed blocks](#cache-failed-blocks) configuration.
    pub fn set_cache_failed_blocks(&mut self, cache_failed_blocks: bool) {
        self.cache_failed_blocks = cache_failed_blocks;
    }

    /// Get the [view concurrent target](#view-concurrent-target) configuration.
    #[must_use]
    pub fn view_concurrent_target(&self) -> usize {
        self.view_concurrent_target
    }

    /// Set the [view concurrent target](#view-concurrent-target) configuration.
    pub fn set_view_concurrent_target(&mut self, view_concurrent_target: usize) {
        self.view_concurrent_target = view_concurrent_target;
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global `pyramid_cache` configuration.
///
/// This might deadlock if the global config is already mutably held by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG.get_or_init(|| RwLock::new(Config::default())).read()
}

/// Returns a mutable reference to the global `pyramid_cache` configuration.
///
/// This might deadlock if the global config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG.get_or_init(|| RwLock::new(Config::default())).write()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_fetch_queue_capacity() {
        let default = global_config().fetch_queue_capacity();
        global_config_mut().set_fetch_queue_capacity(16);
        assert_eq!(global_config().fetch_queue_capacity(), 16);
        global_config_mut().set_fetch_queue_capacity(default);
    }

    #[test]
    fn config_defaults() {
        let config = Config::default();
        assert!(config.fetcher_threads() >= 1);
        assert!(config.cache_failed_blocks());
        assert_eq!(config.fetch_queue_capacity(), 4096);
    }
}
