//! The block loader: the cache store and its get-or-load protocol.
//!
//! A [`BlockLoader`] combines the resolution level table, a [`BlockReader`](crate::storage::BlockReader), a [`BlockCache`],
//! and the fetch queues and worker pool that load blocks in the background.
//!
//! A loader starts closed. The first access opens it, creating the cache and starting the workers,
//! and [`close`](BlockLoader::close) returns it to the closed state. Closing and reopening is transparent to callers.
//!
//! Every block is resolved according to a [`LoadPolicy`]:
//!  - [`Blocking`](LoadPolicy::Blocking) accesses wait until the block is loaded, loading it on the calling thread if no one else is.
//!  - [`Budgeted`](LoadPolicy::Budgeted) accesses never wait: the block is enqueued for a worker (at most once) and a zero-filled
//!    placeholder flagged as not valid is returned until it is loaded.
//!
//! Blocks that are absent from storage or fail to load resolve to zero-filled valid blocks.

mod loader_errors;
mod loader_options;
mod statistics;

use std::{
    any::Any,
    collections::HashMap,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, OnceLock},
};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

pub use loader_errors::BlockLoaderError;
pub use loader_options::{BlockLoaderOptions, BlockLoaderOptionsBuilder, CacheCapacity};
pub use statistics::LoaderStatistics;

use crate::{
    block::{BlockKey, CachedBlock, DataBlock, DecodeResult},
    block_cache::{
        BlockCache, BlockCacheLruBlockLimit, BlockCacheLruSizeLimit, BlockCacheUnbounded,
        EntryClaim,
    },
    fetch::{FetchQueues, FetchTask, LoadPolicy, Priority, WorkerPool},
    pyramid::{AttributeProvider, Channel, ChannelId, MipmapTransform, Pyramid},
    storage::ReadableBlockStorage,
    view::VirtualArrayView,
};

/// Shared by the loader and its workers.
struct LoadContext {
    reader: ReadableBlockStorage,
    cache: Arc<dyn BlockCache>,
    statistics: Arc<LoaderStatistics>,
    cache_failed_blocks: bool,
}

impl LoadContext {
    /// Read and decode the block of a claimed entry, then complete the entry.
    ///
    /// A panic while reading or decoding counts as a failed block, so the entry is always completed.
    fn load(&self, task: &FetchTask) -> Arc<DataBlock> {
        let key = task.key();
        let decoder = task.decoder();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            decoder.decode(key, self.reader.read_block(key), task.block_len())
        }))
        .unwrap_or_else(|payload| {
            let reason = panic_message(&*payload);
            warn!(block = %key, %reason, "block load panicked, substituting zeros");
            DecodeResult::Failed(reason)
        });
        self.statistics.record_decode(&result);
        let failed = result.is_failed();
        let block = Arc::new(result.into_block(decoder.data_type(), task.block_len()));
        task.entry().complete(block.clone());
        if failed && !self.cache_failed_blocks {
            self.cache.remove(key);
        } else {
            self.cache.entry_loaded(task.entry());
        }
        block
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}

/// The state of an open loader.
struct OpenState {
    context: Arc<LoadContext>,
    queues: Arc<FetchQueues>,
    workers: Mutex<WorkerPool>,
    placeholders: Mutex<HashMap<(ChannelId, usize), Arc<DataBlock>>>,
}

impl OpenState {
    fn new(
        reader: ReadableBlockStorage,
        statistics: Arc<LoaderStatistics>,
        options: &BlockLoaderOptions,
        num_queues: usize,
    ) -> Result<Self, BlockLoaderError> {
        let cache: Arc<dyn BlockCache> = match options.cache_capacity() {
            CacheCapacity::Unbounded => Arc::new(BlockCacheUnbounded::new()),
            CacheCapacity::Blocks(capacity) => Arc::new(BlockCacheLruBlockLimit::new(capacity)),
            CacheCapacity::Bytes(capacity) => Arc::new(BlockCacheLruSizeLimit::new(capacity)),
        };
        let context = Arc::new(LoadContext {
            reader,
            cache,
            statistics,
            cache_failed_blocks: options.cache_failed_blocks(),
        });
        let queues = Arc::new(FetchQueues::new(num_queues, options.fetch_queue_capacity()));
        if options.fetcher_threads() == 0 {
            debug!("block loader opened without fetcher threads, budgeted blocks stay pending");
        }
        let workers = {
            let context = context.clone();
            WorkerPool::new(options.fetcher_threads(), queues.clone(), move |task| {
                // A blocking access may have claimed or loaded the block since it was enqueued
                if let EntryClaim::Acquired = task.entry().try_claim() {
                    context.load(&task);
                }
            })?
        };
        Ok(Self {
            context,
            queues,
            workers: Mutex::new(workers),
            placeholders: Mutex::new(HashMap::new()),
        })
    }

    fn get(&self, key: &BlockKey, channel: &Channel, policy: LoadPolicy) -> CachedBlock {
        let statistics = &self.context.statistics;
        let entry = self.context.cache.get_or_insert(key);
        if let Some(block) = entry.valid_block() {
            statistics.record_hit();
            return CachedBlock::new_valid(block);
        }
        statistics.record_miss();

        let block_len = channel
            .level(key.level())
            .map_or(0, |level| level.block_len());
        let task = FetchTask::new(entry, *channel.decoder(), block_len);
        match policy {
            LoadPolicy::Blocking => {
                let block = match task.entry().try_claim() {
                    EntryClaim::Loaded(block) => block,
                    EntryClaim::InFlight => task.entry().wait(),
                    EntryClaim::Acquired => self.context.load(&task),
                };
                CachedBlock::new_valid(block)
            }
            LoadPolicy::Budgeted(priority) => {
                if task.entry().mark_enqueued() {
                    self.enqueue(task, priority);
                }
                CachedBlock::new_pending(self.placeholder(channel, key.level(), block_len))
            }
        }
    }

    fn enqueue(&self, task: FetchTask, priority: Priority) {
        trace!(block = %task.key(), %priority, "block enqueued");
        self.context.statistics.record_enqueued();
        if let Some(dropped) = self.queues.put(task, priority) {
            trace!(block = %dropped.key(), "fetch task dropped");
            dropped.entry().clear_enqueued();
            self.context.statistics.record_dropped();
        }
    }

    /// Return the zero-filled placeholder shared by every pending block of a level.
    fn placeholder(&self, channel: &Channel, level: usize, block_len: usize) -> Arc<DataBlock> {
        self.placeholders
            .lock()
            .entry((channel.id(), level))
            .or_insert_with(|| Arc::new(DataBlock::zeros(channel.data_type(), block_len)))
            .clone()
    }

    fn clear(&self) {
        for task in self.queues.clear() {
            task.entry().clear_enqueued();
        }
        self.context.cache.clear();
    }

    fn shutdown(&self) {
        for task in self.workers.lock().shutdown() {
            task.entry().clear_enqueued();
        }
        self.context.cache.clear();
        self.placeholders.lock().clear();
    }
}

/// A lazy block cache over a multi-resolution dataset.
///
/// ### Example
/// ```
/// # use std::sync::Arc;
/// use pyramid_cache::block::BlockKey;
/// use pyramid_cache::data_type::DataType;
/// use pyramid_cache::fetch::LoadPolicy;
/// use pyramid_cache::loader::BlockLoader;
/// use pyramid_cache::pyramid::{ChannelAttributes, MemoryAttributeProvider};
/// use pyramid_cache::storage::MemoryBlockReader;
///
/// let attributes = MemoryAttributeProvider::new().with_channel(
///     0,
///     ChannelAttributes::new_pyramid(DataType::UInt8, vec![4, 4], vec![2, 2], 2),
/// );
/// let reader = Arc::new(MemoryBlockReader::new());
/// reader.set(BlockKey::new(0, 0, 0, vec![1, 1]), vec![1u8, 2, 3, 4]);
/// let loader = BlockLoader::new(Arc::new(attributes), reader);
///
/// let block = loader.get(&BlockKey::new(0, 0, 0, vec![1, 1]), LoadPolicy::Blocking)?;
/// assert!(block.is_valid());
/// assert_eq!(block.data().as_slice::<u8>(), Some([1u8, 2, 3, 4].as_slice()));
///
/// let image = loader.image(0, 0, 0)?;
/// assert_eq!(image.get::<u8>(&[3, 3])?, 4);
/// assert_eq!(image.get::<u8>(&[0, 0])?, 0); // absent
/// loader.close();
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct BlockLoader {
    attributes: Arc<dyn AttributeProvider>,
    reader: ReadableBlockStorage,
    options: BlockLoaderOptions,
    pyramid: OnceLock<Arc<Pyramid>>,
    statistics: Arc<LoaderStatistics>,
    state: RwLock<Option<Arc<OpenState>>>,
}

impl core::fmt::Debug for BlockLoader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BlockLoader")
            .field("options", &self.options)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl BlockLoader {
    /// Create a new closed block loader with the default [`BlockLoaderOptions`].
    #[must_use]
    pub fn new(attributes: Arc<dyn AttributeProvider>, reader: ReadableBlockStorage) -> Self {
        Self::with_options(attributes, reader, BlockLoaderOptions::default())
    }

    /// Create a new closed block loader with `options`.
    #[must_use]
    pub fn with_options(
        attributes: Arc<dyn AttributeProvider>,
        reader: ReadableBlockStorage,
        options: BlockLoaderOptions,
    ) -> Self {
        Self {
            attributes,
            reader,
            options,
            pyramid: OnceLock::new(),
            statistics: Arc::new(LoaderStatistics::new()),
            state: RwLock::new(None),
        }
    }

    /// Return the options of the loader.
    #[must_use]
    pub fn options(&self) -> &BlockLoaderOptions {
        &self.options
    }

    /// Return the resolution level table, building it on first use.
    pub fn pyramid(&self) -> &Arc<Pyramid> {
        self.pyramid
            .get_or_init(|| Arc::new(Pyramid::new(self.attributes.as_ref())))
    }

    /// Return the loader statistics.
    #[must_use]
    pub fn statistics(&self) -> &LoaderStatistics {
        &self.statistics
    }

    /// Return the number of resolution levels of `channel`, or [`None`] if the channel is unknown.
    #[must_use]
    pub fn num_resolution_levels(&self, channel: ChannelId) -> Option<usize> {
        self.pyramid().num_resolution_levels(channel)
    }

    /// Return the mipmap transform of `level` of `channel`.
    #[must_use]
    pub fn mipmap_transform(&self, channel: ChannelId, level: usize) -> Option<&MipmapTransform> {
        self.pyramid().mipmap_transform(channel, level)
    }

    /// Returns true if the loader is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.read().is_some()
    }

    /// Open the loader if it is closed and return its state.
    fn open(&self) -> Result<Arc<OpenState>, BlockLoaderError> {
        if let Some(state) = self.state.read().as_ref() {
            return Ok(state.clone());
        }
        let mut guard = self.state.write();
        if let Some(state) = guard.as_ref() {
            return Ok(state.clone());
        }
        let num_queues = self.pyramid().max_num_levels();
        let state = Arc::new(OpenState::new(
            self.reader.clone(),
            self.statistics.clone(),
            &self.options,
            num_queues,
        )?);
        debug!(
            workers = self.options.fetcher_threads(),
            queues = state.queues.num_queues(),
            "block loader opened"
        );
        *guard = Some(state.clone());
        Ok(state)
    }

    fn open_state(&self) -> Option<Arc<OpenState>> {
        self.state.read().clone()
    }

    /// Return the channel and validate the coordinates of `key`.
    fn resolve(&self, key: &BlockKey) -> Result<Arc<Channel>, BlockLoaderError> {
        let channel = self.resolve_level(key.channel(), key.timepoint(), key.level())?;
        let level = channel
            .level(key.level())
            .ok_or(BlockLoaderError::InvalidLevel(
                key.channel(),
                key.level(),
                channel.num_levels(),
            ))?;
        if !level.contains_grid_indices(key.grid_indices()) {
            return Err(BlockLoaderError::InvalidGridIndices(
                key.grid_indices().to_vec(),
                level.grid_shape().to_vec(),
            ));
        }
        Ok(channel)
    }

    fn resolve_level(
        &self,
        channel: ChannelId,
        timepoint: u32,
        level: usize,
    ) -> Result<Arc<Channel>, BlockLoaderError> {
        let channel_ref = self
            .pyramid()
            .channel(channel)
            .ok_or(BlockLoaderError::UnknownChannel(channel))?;
        if level >= channel_ref.num_levels() {
            return Err(BlockLoaderError::InvalidLevel(
                channel,
                level,
                channel_ref.num_levels(),
            ));
        }
        if let Some(num_timepoints) = channel_ref.num_timepoints() {
            if timepoint >= num_timepoints {
                return Err(BlockLoaderError::InvalidTimepoint(
                    channel,
                    timepoint,
                    num_timepoints,
                ));
            }
        }
        Ok(channel_ref.clone())
    }

    /// Get the block at `key`, resolving a cache miss according to `policy`.
    ///
    /// Opens the loader if it is closed.
    /// A block that is absent or fails to load is returned as a zero-filled valid block.
    ///
    /// # Errors
    /// Returns a [`BlockLoaderError`] if `key` does not address a block of the resolution level table,
    /// or the loader cannot be opened.
    pub fn get(&self, key: &BlockKey, policy: LoadPolicy) -> Result<CachedBlock, BlockLoaderError> {
        let channel = self.resolve(key)?;
        let state = self.open()?;
        Ok(state.get(key, &channel, policy))
    }

    /// Drop every cached block and queued fetch task.
    ///
    /// Loads already in progress complete, but their blocks are not retained.
    pub fn clear_cache(&self) {
        if let Some(state) = self.open_state() {
            state.clear();
            debug!("block cache cleared");
        }
    }

    /// Close the loader: stop the workers, drop every cached block and close the reader.
    ///
    /// The next access reopens the loader.
    pub fn close(&self) {
        let state = self.state.write().take();
        if let Some(state) = state {
            state.shutdown();
            self.reader.close();
            debug!("block loader closed");
        }
    }

    /// Return the number of live fetcher threads. This is zero if the loader is closed.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.open_state()
            .map_or(0, |state| state.workers.lock().live_workers())
    }

    /// Return the number of cached blocks, including pending blocks.
    #[must_use]
    pub fn cached_block_count(&self) -> usize {
        self.open_state()
            .map_or(0, |state| state.context.cache.len())
    }

    /// Return the number of queued fetch tasks.
    #[must_use]
    pub fn queued_task_count(&self) -> usize {
        self.open_state().map_or(0, |state| state.queues.len())
    }

    /// Return a view of `level` of `channel` at `timepoint` resolving blocks with `policy`.
    ///
    /// # Errors
    /// Returns a [`BlockLoaderError`] if the channel, timepoint or level is invalid.
    pub fn view(
        &self,
        channel: ChannelId,
        timepoint: u32,
        level: usize,
        policy: LoadPolicy,
    ) -> Result<VirtualArrayView<'_>, BlockLoaderError> {
        let channel = self.resolve_level(channel, timepoint, level)?;
        Ok(VirtualArrayView::new(self, channel, timepoint, level, policy))
    }

    /// Return a view of `level` of `channel` at `timepoint` that waits for every block.
    ///
    /// # Errors
    /// Returns a [`BlockLoaderError`] if the channel, timepoint or level is invalid.
    pub fn image(
        &self,
        channel: ChannelId,
        timepoint: u32,
        level: usize,
    ) -> Result<VirtualArrayView<'_>, BlockLoaderError> {
        self.view(channel, timepoint, level, LoadPolicy::Blocking)
    }

    /// Return a view of `level` of `channel` at `timepoint` that never waits for blocks.
    ///
    /// Missing blocks are fetched in the background and read as zero until loaded.
    /// The fetch priority depends only on the level index: level `i` of every channel shares a priority,
    /// and lower indices are fetched after higher ones. In a channel with fewer levels than the
    /// deepest channel, the coarsest level is therefore not at [`Priority::HIGHEST`].
    ///
    /// # Errors
    /// Returns a [`BlockLoaderError`] if the channel, timepoint or level is invalid.
    pub fn volatile_image(
        &self,
        channel: ChannelId,
        timepoint: u32,
        level: usize,
    ) -> Result<VirtualArrayView<'_>, BlockLoaderError> {
        let priority = Priority::for_level(level, self.pyramid().max_num_levels());
        self.view(channel, timepoint, level, LoadPolicy::Budgeted(priority))
    }
}
