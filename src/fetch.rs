//! Background fetching of blocks.
//!
//! Budgeted accesses place a [`FetchTask`] in the [`FetchQueues`], one bounded queue per [`Priority`].
//! A [`WorkerPool`] of dedicated threads drains the queues, always serving the most urgent non-empty queue first.

mod fetch_queues;
mod worker_pool;

use std::sync::Arc;

use derive_more::{Display, From};

pub use fetch_queues::FetchQueues;
pub use worker_pool::WorkerPool;

use crate::{
    block::{BlockDecoder, BlockKey},
    block_cache::CacheEntry,
};

/// The priority of a fetch task. A lower value is served first.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
#[display("priority {_0}")]
pub struct Priority(u32);

impl Priority {
    /// The most urgent priority.
    pub const HIGHEST: Self = Self(0);

    /// Create a new priority.
    #[must_use]
    pub const fn new(priority: u32) -> Self {
        Self(priority)
    }

    /// Return the priority value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Return the priority of resolution level `level` of a channel with `num_levels` levels.
    ///
    /// Coarser levels are more urgent: the coarsest level has the [highest](Self::HIGHEST) priority.
    #[must_use]
    pub fn for_level(level: usize, num_levels: usize) -> Self {
        let priority = num_levels.saturating_sub(1).saturating_sub(level);
        Self(u32::try_from(priority).unwrap_or(u32::MAX))
    }
}

/// How a cache miss is resolved.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoadPolicy {
    /// The caller waits until the block is loaded.
    #[default]
    Blocking,
    /// The block is loaded in the background and the caller immediately receives a zero-filled placeholder.
    Budgeted(Priority),
}

/// A pending load of one block.
#[derive(Clone, Debug)]
pub struct FetchTask {
    entry: Arc<CacheEntry>,
    decoder: BlockDecoder,
    block_len: usize,
}

impl FetchTask {
    /// Create a task loading `entry` with `decoder` into a block of `block_len` elements.
    #[must_use]
    pub fn new(entry: Arc<CacheEntry>, decoder: BlockDecoder, block_len: usize) -> Self {
        Self {
            entry,
            decoder,
            block_len,
        }
    }

    /// Return the cache entry being loaded.
    #[must_use]
    pub fn entry(&self) -> &Arc<CacheEntry> {
        &self.entry
    }

    /// Return the key of the block.
    #[must_use]
    pub fn key(&self) -> &BlockKey {
        self.entry.key()
    }

    /// Return the decoder of the block.
    #[must_use]
    pub const fn decoder(&self) -> &BlockDecoder {
        &self.decoder
    }

    /// Return the number of elements in the block.
    #[must_use]
    pub const fn block_len(&self) -> usize {
        self.block_len
    }
}
