//! The resolution level table.
//!
//! A [`Pyramid`] holds every [`Channel`] of a dataset and its ordered [`ResolutionLevel`]s, built once from an [`AttributeProvider`].
//! Channels with missing or inconsistent attributes are skipped (and logged) without affecting other channels.

mod attribute_provider;
mod channel;
mod mipmap_transform;
mod resolution_level;

use std::{collections::BTreeMap, sync::Arc};

use thiserror::Error;
use tracing::{debug, warn};

pub use attribute_provider::{
    AttributeProvider, ChannelAttributes, LevelAttributes, MemoryAttributeProvider,
};
pub use channel::Channel;
pub use mipmap_transform::MipmapTransform;
pub use resolution_level::ResolutionLevel;

use crate::{block::Compression, data_type::UnsupportedDataTypeError};

/// A channel identifier.
pub type ChannelId = u32;

/// A channel creation error.
#[derive(Clone, Debug, Error)]
pub enum ChannelCreateError {
    /// A required attribute is missing.
    #[error("channel {channel} is missing attribute {attribute}{}", .level.map_or(String::new(), |level| format!(" at level {level}")))]
    MissingAttributes {
        /// The channel.
        channel: ChannelId,
        /// The missing attribute.
        attribute: &'static str,
        /// The level of the missing attribute, if level specific.
        level: Option<usize>,
    },
    /// The declared data type has no decoder.
    #[error("channel {channel}: {err}")]
    UnsupportedDataType {
        /// The channel.
        channel: ChannelId,
        /// The underlying error.
        err: UnsupportedDataTypeError,
    },
    /// The declared compression is not enabled.
    #[error("channel {channel}: compression {compression:?} is not enabled")]
    UnsupportedCompression {
        /// The channel.
        channel: ChannelId,
        /// The compression.
        compression: Compression,
    },
    /// Attributes are present but inconsistent.
    #[error("channel {channel} has invalid attributes: {reason}")]
    InvalidAttributes {
        /// The channel.
        channel: ChannelId,
        /// The reason the attributes are invalid.
        reason: String,
    },
}

/// The resolution level table of a multi-channel dataset.
#[derive(Debug, Default)]
pub struct Pyramid {
    channels: BTreeMap<ChannelId, Arc<Channel>>,
    skipped: BTreeMap<ChannelId, ChannelCreateError>,
}

impl Pyramid {
    /// Build the table from the attributes supplied by `provider`.
    ///
    /// Each channel that cannot be built is logged once and skipped.
    #[must_use]
    pub fn new(provider: &dyn AttributeProvider) -> Self {
        let mut channels = BTreeMap::new();
        let mut skipped = BTreeMap::new();
        for id in provider.channel_ids() {
            match Channel::new(id, provider) {
                Ok(channel) => {
                    debug!(
                        channel = id,
                        name = channel.name(),
                        levels = channel.num_levels(),
                        data_type = %channel.data_type(),
                        "channel loaded"
                    );
                    channels.insert(id, Arc::new(channel));
                }
                Err(err) => {
                    warn!(channel = id, error = %err, "skipping channel");
                    skipped.insert(id, err);
                }
            }
        }
        Self { channels, skipped }
    }

    /// Return the channel `id`.
    #[must_use]
    pub fn channel(&self, id: ChannelId) -> Option<&Arc<Channel>> {
        self.channels.get(&id)
    }

    /// Return an iterator over the channels in id order.
    pub fn channels(&self) -> impl Iterator<Item = &Arc<Channel>> {
        self.channels.values()
    }

    /// Return the ids of the channels.
    #[must_use]
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        self.channels.keys().copied().collect()
    }

    /// Return the channels that were skipped and why.
    #[must_use]
    pub fn skipped_channels(&self) -> &BTreeMap<ChannelId, ChannelCreateError> {
        &self.skipped
    }

    /// Return the number of resolution levels of `channel`.
    #[must_use]
    pub fn num_resolution_levels(&self, channel: ChannelId) -> Option<usize> {
        self.channel(channel).map(|channel| channel.num_levels())
    }

    /// Return the mipmap transform of `level` of `channel`.
    #[must_use]
    pub fn mipmap_transform(&self, channel: ChannelId, level: usize) -> Option<&MipmapTransform> {
        self.channel(channel)?
            .level(level)
            .map(ResolutionLevel::mipmap_transform)
    }

    /// Return the number of distinct resolution levels across all channels.
    ///
    /// This is the number of fetch priorities.
    #[must_use]
    pub fn max_num_levels(&self) -> usize {
        self.channels
            .values()
            .map(|channel| channel.num_levels())
            .max()
            .unwrap_or(0)
    }
}
