//! Blocks: the unit of caching and decoding.
//!
//! A block is a fixed-size rectangular region of one resolution level of one channel at one timepoint.
//! It is uniquely identified by a [`BlockKey`], decoded from raw bytes by a [`BlockDecoder`] into a [`DataBlock`],
//! and handed to callers as a [`CachedBlock`] that is either valid (decoded) or a pending placeholder.

mod block_decoder;
mod compression;
mod data_block;

use std::sync::Arc;

use itertools::Itertools;

pub use block_decoder::{BlockDecoder, DecodeResult};
pub use compression::Compression;
pub use data_block::DataBlock;

use crate::{pyramid::ChannelId, ArrayIndices};

/// The unique key of a block: channel, timepoint, resolution level and grid indices.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey {
    channel: ChannelId,
    timepoint: u32,
    level: usize,
    grid_indices: ArrayIndices,
}

impl BlockKey {
    /// Create a new block key.
    #[must_use]
    pub fn new(channel: ChannelId, timepoint: u32, level: usize, grid_indices: ArrayIndices) -> Self {
        Self {
            channel,
            timepoint,
            level,
            grid_indices,
        }
    }

    /// Return the channel.
    #[must_use]
    pub const fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Return the timepoint.
    #[must_use]
    pub const fn timepoint(&self) -> u32 {
        self.timepoint
    }

    /// Return the resolution level.
    #[must_use]
    pub const fn level(&self) -> usize {
        self.level
    }

    /// Return the indices of the block in the block grid of its level.
    #[must_use]
    pub fn grid_indices(&self) -> &[u64] {
        &self.grid_indices
    }
}

impl std::fmt::Display for BlockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "c{}/t{}/s{}/[{}]",
            self.channel,
            self.timepoint,
            self.level,
            self.grid_indices.iter().format(", ")
        )
    }
}

/// A block returned by the cache.
///
/// A valid block holds decoded data and is never mutated.
/// An invalid block is a zero-filled placeholder standing in for data that is still being fetched.
#[derive(Clone, Debug)]
pub struct CachedBlock {
    data: Arc<DataBlock>,
    valid: bool,
}

impl CachedBlock {
    /// Create a valid block.
    #[must_use]
    pub fn new_valid(data: Arc<DataBlock>) -> Self {
        Self { data, valid: true }
    }

    /// Create a pending placeholder block.
    #[must_use]
    pub fn new_pending(placeholder: Arc<DataBlock>) -> Self {
        Self {
            data: placeholder,
            valid: false,
        }
    }

    /// Returns true if the block holds decoded data rather than a placeholder.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Return the block data.
    #[must_use]
    pub fn data(&self) -> &Arc<DataBlock> {
        &self.data
    }

    /// Convert into the block data.
    #[must_use]
    pub fn into_data(self) -> Arc<DataBlock> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use crate::data_type::DataType;

    use super::*;

    #[test]
    fn block_key_display() {
        let key = BlockKey::new(2, 5, 1, vec![0, 3, 4]);
        assert_eq!(key.to_string(), "c2/t5/s1/[0, 3, 4]");
        assert_eq!(key.grid_indices(), &[0, 3, 4]);
    }

    #[test]
    fn cached_block_validity() {
        let data = Arc::new(DataBlock::zeros(DataType::UInt8, 8));
        let pending = CachedBlock::new_pending(data.clone());
        assert!(!pending.is_valid());
        let valid = CachedBlock::new_valid(data);
        assert!(valid.is_valid());
        assert_eq!(valid.data().len(), 8);
    }
}
