use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    block::Compression,
    data_type::{DataType, Endianness},
    ArrayShape,
};

use super::ChannelId;

/// Supplies the attributes of each channel and its resolution levels.
///
/// Every method returns [`None`] if an attribute is missing.
/// A channel with missing required attributes is skipped when the [`Pyramid`](super::Pyramid) is built.
pub trait AttributeProvider: Send + Sync {
    /// Return the identifiers of all channels.
    fn channel_ids(&self) -> Vec<ChannelId>;

    /// Return the number of resolution levels of `channel`.
    fn num_levels(&self, channel: ChannelId) -> Option<usize>;

    /// Return the dimensions of `level` of `channel`.
    ///
    /// Required for level 0, derived from the downsampling factors for other levels if missing.
    fn dimensions(&self, channel: ChannelId, level: usize) -> Option<ArrayShape>;

    /// Return the block size of `level` of `channel`.
    ///
    /// Required for level 0, the level 0 block size is used for other levels if missing.
    fn block_size(&self, channel: ChannelId, level: usize) -> Option<ArrayShape>;

    /// Return the downsampling factors of `level` of `channel` relative to level 0.
    fn downsampling_factors(&self, channel: ChannelId, level: usize) -> Option<Vec<u64>>;

    /// Return the declared data type name of `channel` (e.g. `uint16`).
    fn data_type(&self, channel: ChannelId) -> Option<String>;

    /// Return the name of `channel`.
    fn channel_name(&self, _channel: ChannelId) -> Option<String> {
        None
    }

    /// Return the level 0 voxel size of `channel`.
    fn voxel_size(&self, _channel: ChannelId) -> Option<Vec<f64>> {
        None
    }

    /// Return the number of timepoints of `channel`, if known.
    fn num_timepoints(&self, _channel: ChannelId) -> Option<u32> {
        None
    }

    /// Return the endianness of encoded blocks of `channel`.
    fn endianness(&self, _channel: ChannelId) -> Option<Endianness> {
        None
    }

    /// Return the compression of encoded blocks of `channel`.
    fn compression(&self, _channel: ChannelId) -> Option<Compression> {
        None
    }
}

/// The attributes of one resolution level.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelAttributes {
    /// The level dimensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<ArrayShape>,
    /// The level block size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_size: Option<ArrayShape>,
    /// The downsampling factors relative to level 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downsampling_factors: Option<Vec<u64>>,
}

impl LevelAttributes {
    /// Create level attributes with all attributes present.
    #[must_use]
    pub fn new(dimensions: ArrayShape, block_size: ArrayShape, downsampling_factors: Vec<u64>) -> Self {
        Self {
            dimensions: Some(dimensions),
            block_size: Some(block_size),
            downsampling_factors: Some(downsampling_factors),
        }
    }
}

/// The attributes of one channel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelAttributes {
    /// The channel name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The declared data type name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    /// The level 0 voxel size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voxel_size: Option<Vec<f64>>,
    /// The number of timepoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_timepoints: Option<u32>,
    /// The endianness of encoded blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endianness: Option<Endianness>,
    /// The compression of encoded blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<Compression>,
    /// The resolution levels, finest first.
    pub levels: Vec<LevelAttributes>,
}

impl ChannelAttributes {
    /// Create channel attributes for `data_type` with explicit `levels`.
    #[must_use]
    pub fn new(data_type: DataType, levels: Vec<LevelAttributes>) -> Self {
        Self {
            data_type: Some(data_type.identifier().to_string()),
            levels,
            ..Default::default()
        }
    }

    /// Create channel attributes for a power-of-two pyramid with `num_levels` levels.
    ///
    /// Level `l` is downsampled by `2^l` in every dimension and every level shares `block_size`.
    #[must_use]
    pub fn new_pyramid(
        data_type: DataType,
        dimensions: ArrayShape,
        block_size: ArrayShape,
        num_levels: usize,
    ) -> Self {
        let levels = (0..num_levels)
            .map(|level| {
                let factor = 1u64 << level;
                LevelAttributes::new(
                    dimensions.iter().map(|d| d.div_ceil(factor)).collect(),
                    block_size.clone(),
                    vec![factor; dimensions.len()],
                )
            })
            .collect();
        Self::new(data_type, levels)
    }

    /// Set the channel name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the level 0 voxel size.
    #[must_use]
    pub fn with_voxel_size(mut self, voxel_size: Vec<f64>) -> Self {
        self.voxel_size = Some(voxel_size);
        self
    }

    /// Set the number of timepoints.
    #[must_use]
    pub fn with_num_timepoints(mut self, num_timepoints: u32) -> Self {
        self.num_timepoints = Some(num_timepoints);
        self
    }

    /// Set the endianness of encoded blocks.
    #[must_use]
    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = Some(endianness);
        self
    }

    /// Set the compression of encoded blocks.
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = Some(compression);
        self
    }
}

/// An in-memory [`AttributeProvider`].
///
/// ### Example
/// ```rust
/// # use pyramid_cache::pyramid::{AttributeProvider, MemoryAttributeProvider};
/// let provider = MemoryAttributeProvider::from_json(r#"{
///     "0": {
///         "data_type": "uint16",
///         "levels": [
///             { "dimensions": [64, 64, 32], "block_size": [32, 32, 32], "downsampling_factors": [1, 1, 1] },
///             { "dimensions": [32, 32, 16], "block_size": [32, 32, 16], "downsampling_factors": [2, 2, 2] }
///         ]
///     }
/// }"#)?;
/// assert_eq!(provider.num_levels(0), Some(2));
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryAttributeProvider {
    channels: BTreeMap<ChannelId, ChannelAttributes>,
}

impl MemoryAttributeProvider {
    /// Create a new empty attribute provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel, replacing any existing channel with the same id.
    #[must_use]
    pub fn with_channel(mut self, channel: ChannelId, attributes: ChannelAttributes) -> Self {
        self.channels.insert(channel, attributes);
        self
    }

    /// Add a channel, replacing any existing channel with the same id.
    pub fn insert_channel(&mut self, channel: ChannelId, attributes: ChannelAttributes) {
        self.channels.insert(channel, attributes);
    }

    /// Deserialise the provider from a JSON object mapping channel ids to [`ChannelAttributes`].
    ///
    /// # Errors
    /// Returns a [`serde_json::Error`] if `json` is not valid.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn level(&self, channel: ChannelId, level: usize) -> Option<&LevelAttributes> {
        self.channels.get(&channel)?.levels.get(level)
    }
}

impl AttributeProvider for MemoryAttributeProvider {
    fn channel_ids(&self) -> Vec<ChannelId> {
        self.channels.keys().copied().collect()
    }

    fn num_levels(&self, channel: ChannelId) -> Option<usize> {
        self.channels.get(&channel).map(|attributes| attributes.levels.len())
    }

    fn dimensions(&self, channel: ChannelId, level: usize) -> Option<ArrayShape> {
        self.level(channel, level)?.dimensions.clone()
    }

    fn block_size(&self, channel: ChannelId, level: usize) -> Option<ArrayShape> {
        self.level(channel, level)?.block_size.clone()
    }

    fn downsampling_factors(&self, channel: ChannelId, level: usize) -> Option<Vec<u64>> {
        self.level(channel, level)?.downsampling_factors.clone()
    }

    fn data_type(&self, channel: ChannelId) -> Option<String> {
        self.channels.get(&channel)?.data_type.clone()
    }

    fn channel_name(&self, channel: ChannelId) -> Option<String> {
        self.channels.get(&channel)?.name.clone()
    }

    fn voxel_size(&self, channel: ChannelId) -> Option<Vec<f64>> {
        self.channels.get(&channel)?.voxel_size.clone()
    }

    fn num_timepoints(&self, channel: ChannelId) -> Option<u32> {
        self.channels.get(&channel)?.num_timepoints
    }

    fn endianness(&self, channel: ChannelId) -> Option<Endianness> {
        self.channels.get(&channel)?.endianness
    }

    fn compression(&self, channel: ChannelId) -> Option<Compression> {
        self.channels.get(&channel)?.compression
    }
}
