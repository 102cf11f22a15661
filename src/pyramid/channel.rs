use tracing::warn;

use crate::{
    block::{BlockDecoder, Compression},
    data_type::{DataType, Endianness},
    ArrayShape,
};

use super::{
    AttributeProvider, ChannelCreateError, ChannelId, MipmapTransform, ResolutionLevel,
};

/// A channel: one image stream with an ordered list of resolution levels.
///
/// A channel is built once from an [`AttributeProvider`] and is read-only thereafter.
#[derive(Debug)]
pub struct Channel {
    id: ChannelId,
    name: String,
    voxel_size: Vec<f64>,
    num_timepoints: Option<u32>,
    decoder: BlockDecoder,
    levels: Vec<ResolutionLevel>,
}

impl Channel {
    /// Build channel `id` from the attributes supplied by `provider`.
    ///
    /// Level dimensions are derived from the level 0 dimensions and the level downsampling factors so that levels remain spatially aligned.
    /// A provided level dimension that disagrees is logged and replaced.
    ///
    /// # Errors
    /// Returns a [`ChannelCreateError`] if attributes are missing or inconsistent, or the data type or compression is unsupported.
    pub fn new(id: ChannelId, provider: &dyn AttributeProvider) -> Result<Self, ChannelCreateError> {
        let missing = |attribute: &'static str, level: Option<usize>| {
            ChannelCreateError::MissingAttributes {
                channel: id,
                attribute,
                level,
            }
        };
        let invalid = |reason: String| ChannelCreateError::InvalidAttributes { channel: id, reason };

        let num_levels = provider
            .num_levels(id)
            .ok_or_else(|| missing("num_levels", None))?;
        if num_levels == 0 {
            return Err(invalid("channel has no resolution levels".to_string()));
        }

        let data_type_name = provider
            .data_type(id)
            .ok_or_else(|| missing("data_type", None))?;
        let data_type = DataType::from_name(&data_type_name)
            .map_err(|err| ChannelCreateError::UnsupportedDataType { channel: id, err })?;

        let compression = provider.compression(id).unwrap_or_default();
        if !compression.is_supported() {
            return Err(ChannelCreateError::UnsupportedCompression {
                channel: id,
                compression,
            });
        }
        let endianness = provider.endianness(id).unwrap_or_default();

        let dimensions0 = provider
            .dimensions(id, 0)
            .ok_or_else(|| missing("dimensions", Some(0)))?;
        let dimensionality = dimensions0.len();
        if dimensionality == 0 {
            return Err(invalid("level 0 has no dimensions".to_string()));
        }
        let block_size0 = provider
            .block_size(id, 0)
            .ok_or_else(|| missing("block_size", Some(0)))?;

        let voxel_size = provider
            .voxel_size(id)
            .unwrap_or_else(|| vec![1.0; dimensionality]);
        if voxel_size.len() != dimensionality {
            return Err(invalid(format!(
                "voxel size {voxel_size:?} does not match dimensionality {dimensionality}"
            )));
        }

        let mut levels = Vec::with_capacity(num_levels);
        let mut previous_factors = vec![1u64; dimensionality];
        for level in 0..num_levels {
            let factors = provider
                .downsampling_factors(id, level)
                .ok_or_else(|| missing("downsampling_factors", Some(level)))?;
            if factors.len() != dimensionality {
                return Err(invalid(format!(
                    "level {level} downsampling factors {factors:?} do not match dimensionality {dimensionality}"
                )));
            }
            if level == 0 && factors.iter().any(|&f| f != 1) {
                return Err(invalid(format!(
                    "level 0 downsampling factors {factors:?} are not all 1"
                )));
            }
            if std::iter::zip(&factors, &previous_factors).any(|(f, p)| f < p) {
                return Err(invalid(format!(
                    "level {level} downsampling factors {factors:?} are finer than the previous level {previous_factors:?}"
                )));
            }

            let derived_dimensions: ArrayShape = std::iter::zip(&dimensions0, &factors)
                .map(|(d, f)| d.div_ceil(*f))
                .collect();
            if let Some(dimensions) = provider.dimensions(id, level) {
                if dimensions != derived_dimensions {
                    warn!(
                        channel = id,
                        level,
                        ?dimensions,
                        ?derived_dimensions,
                        "level dimensions disagree with downsampling factors, using derived dimensions"
                    );
                }
            }

            let block_size = if level == 0 {
                block_size0.clone()
            } else {
                provider
                    .block_size(id, level)
                    .unwrap_or_else(|| block_size0.clone())
            };
            if block_size.len() != dimensionality || block_size.contains(&0) {
                return Err(invalid(format!(
                    "level {level} block size {block_size:?} is invalid for dimensionality {dimensionality}"
                )));
            }
            let block_shape = std::iter::zip(block_size, &derived_dimensions)
                .map(|(b, d)| std::cmp::min(b, std::cmp::max(*d, 1)))
                .collect();

            let mipmap_transform = MipmapTransform::new(&voxel_size, &factors);
            levels.push(ResolutionLevel::new(
                level,
                factors.clone(),
                derived_dimensions,
                block_shape,
                mipmap_transform,
            ));
            previous_factors = factors;
        }

        Ok(Self {
            id,
            name: provider
                .channel_name(id)
                .unwrap_or_else(|| format!("channel {id}")),
            voxel_size,
            num_timepoints: provider.num_timepoints(id),
            decoder: BlockDecoder::new(data_type, endianness, compression),
            levels,
        })
    }

    /// Return the channel id.
    #[must_use]
    pub const fn id(&self) -> ChannelId {
        self.id
    }

    /// Return the channel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the level 0 voxel size.
    #[must_use]
    pub fn voxel_size(&self) -> &[f64] {
        &self.voxel_size
    }

    /// Return the number of timepoints, if known.
    #[must_use]
    pub const fn num_timepoints(&self) -> Option<u32> {
        self.num_timepoints
    }

    /// Return the data type.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.decoder.data_type()
    }

    /// Return the endianness of encoded blocks.
    #[must_use]
    pub const fn endianness(&self) -> Endianness {
        self.decoder.endianness()
    }

    /// Return the compression of encoded blocks.
    #[must_use]
    pub const fn compression(&self) -> Compression {
        self.decoder.compression()
    }

    /// Return the block decoder of the channel.
    #[must_use]
    pub const fn decoder(&self) -> &BlockDecoder {
        &self.decoder
    }

    /// Return the resolution levels, finest first.
    #[must_use]
    pub fn levels(&self) -> &[ResolutionLevel] {
        &self.levels
    }

    /// Return the resolution level `level`.
    #[must_use]
    pub fn level(&self, level: usize) -> Option<&ResolutionLevel> {
        self.levels.get(level)
    }

    /// Return the number of resolution levels.
    #[must_use]
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Return the dimensionality of the channel.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.voxel_size.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::pyramid::{ChannelAttributes, LevelAttributes, MemoryAttributeProvider};

    use super::*;

    #[test]
    fn channel_pyramid() {
        let provider = MemoryAttributeProvider::new().with_channel(
            0,
            ChannelAttributes::new_pyramid(DataType::UInt16, vec![100, 64, 40], vec![32, 32, 32], 3)
                .with_voxel_size(vec![0.5, 0.5, 2.0]),
        );
        let channel = Channel::new(0, &provider).unwrap();
        assert_eq!(channel.name(), "channel 0");
        assert_eq!(channel.num_levels(), 3);
        assert_eq!(channel.data_type(), DataType::UInt16);
        let level2 = channel.level(2).unwrap();
        assert_eq!(level2.dimensions(), &[25, 16, 10]);
        assert_eq!(level2.block_shape(), &[25, 16, 10]);
        assert_eq!(level2.grid_shape(), &[1, 1, 1]);
        assert_eq!(level2.mipmap_transform().scale(), &[2.0, 2.0, 8.0]);
        let level1 = channel.level(1).unwrap();
        assert_eq!(level1.block_shape(), &[32, 32, 20]);
        assert_eq!(level1.grid_shape(), &[2, 1, 1]);
    }

    #[test]
    fn channel_derived_dimensions() {
        let provider = MemoryAttributeProvider::new().with_channel(
            0,
            ChannelAttributes::new(
                DataType::Float32,
                vec![
                    LevelAttributes::new(vec![33, 33], vec![8, 8], vec![1, 1]),
                    LevelAttributes {
                        dimensions: Some(vec![16, 16]), // inconsistent, expected [17, 17]
                        block_size: None,
                        downsampling_factors: Some(vec![2, 2]),
                    },
                    LevelAttributes {
                        dimensions: None,
                        block_size: Some(vec![4, 4]),
                        downsampling_factors: Some(vec![4, 4]),
                    },
                ],
            ),
        );
        let channel = Channel::new(0, &provider).unwrap();
        assert_eq!(channel.level(1).unwrap().dimensions(), &[17, 17]);
        assert_eq!(channel.level(1).unwrap().block_shape(), &[8, 8]);
        assert_eq!(channel.level(2).unwrap().dimensions(), &[9, 9]);
        assert_eq!(channel.level(2).unwrap().block_shape(), &[4, 4]);
    }

    #[test]
    fn channel_errors() {
        let provider = MemoryAttributeProvider::new()
            .with_channel(0, ChannelAttributes::default())
            .with_channel(
                1,
                ChannelAttributes::new_pyramid(DataType::UInt8, vec![8, 8], vec![4, 4], 1),
            )
            .with_channel(
                2,
                ChannelAttributes::new(
                    DataType::UInt8,
                    vec![LevelAttributes::new(vec![8, 8], vec![4, 4], vec![2, 1])],
                ),
            );
        assert!(matches!(
            Channel::new(0, &provider),
            Err(ChannelCreateError::InvalidAttributes { channel: 0, .. })
        ));
        let mut attributes =
            ChannelAttributes::new_pyramid(DataType::UInt8, vec![8, 8], vec![4, 4], 1);
        attributes.data_type = Some("complex128".to_string());
        let provider = provider.with_channel(1, attributes);
        assert!(matches!(
            Channel::new(1, &provider),
            Err(ChannelCreateError::UnsupportedDataType { channel: 1, .. })
        ));
        assert!(matches!(
            Channel::new(2, &provider),
            Err(ChannelCreateError::InvalidAttributes { channel: 2, .. })
        ));
        assert!(matches!(
            Channel::new(9, &provider),
            Err(ChannelCreateError::MissingAttributes {
                channel: 9,
                attribute: "num_levels",
                level: None
            })
        ));
    }
}
