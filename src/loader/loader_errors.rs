use thiserror::Error;

use crate::{pyramid::ChannelId, ArrayIndices, ArrayShape};

/// A block loader error.
///
/// Only invalid block coordinates and failures to start the loader are errors.
/// Blocks that are absent or fail to load resolve to zero-filled blocks instead.
#[derive(Debug, Error)]
pub enum BlockLoaderError {
    /// The channel is not in the resolution level table.
    #[error("unknown channel {_0}")]
    UnknownChannel(ChannelId),
    /// The resolution level does not exist.
    #[error("channel {_0} has {_2} resolution levels, got level {_1}")]
    InvalidLevel(ChannelId, usize, usize),
    /// The timepoint is out of range.
    #[error("channel {_0} has {_2} timepoints, got timepoint {_1}")]
    InvalidTimepoint(ChannelId, u32, u32),
    /// The grid indices do not address a block of the level.
    #[error("invalid block grid indices {_0:?} for grid shape {_1:?}")]
    InvalidGridIndices(ArrayIndices, ArrayShape),
    /// A fetcher thread could not be started.
    #[error("failed to start block fetcher: {_0}")]
    WorkerSpawnError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_loader_error_display() {
        assert_eq!(
            BlockLoaderError::InvalidLevel(1, 4, 3).to_string(),
            "channel 1 has 3 resolution levels, got level 4"
        );
        assert_eq!(
            BlockLoaderError::InvalidGridIndices(vec![2, 0], vec![2, 2]).to_string(),
            "invalid block grid indices [2, 0] for grid shape [2, 2]"
        );
    }
}
