use itertools::izip;

use crate::{array_subset::ArraySubset, ArrayIndices, ArrayShape};

use super::MipmapTransform;

/// A resolution level of a channel.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolutionLevel {
    index: usize,
    downsampling_factors: Vec<u64>,
    dimensions: ArrayShape,
    block_shape: ArrayShape,
    grid_shape: ArrayShape,
    block_len: usize,
    mipmap_transform: MipmapTransform,
}

impl ResolutionLevel {
    /// Create a new resolution level.
    ///
    /// `block_shape` must be non-zero in every dimension.
    pub(crate) fn new(
        index: usize,
        downsampling_factors: Vec<u64>,
        dimensions: ArrayShape,
        block_shape: ArrayShape,
        mipmap_transform: MipmapTransform,
    ) -> Self {
        let grid_shape = std::iter::zip(&dimensions, &block_shape)
            .map(|(d, b)| d.div_ceil(*b))
            .collect();
        let block_len = block_shape
            .iter()
            .map(|&b| usize::try_from(b).unwrap_or(usize::MAX))
            .fold(1usize, usize::saturating_mul);
        Self {
            index,
            downsampling_factors,
            dimensions,
            block_shape,
            grid_shape,
            block_len,
            mipmap_transform,
        }
    }

    /// Return the level index. Level 0 is the finest.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Return the downsampling factors relative to level 0.
    #[must_use]
    pub fn downsampling_factors(&self) -> &[u64] {
        &self.downsampling_factors
    }

    /// Return the dimensions of the level.
    #[must_use]
    pub fn dimensions(&self) -> &[u64] {
        &self.dimensions
    }

    /// Return the shape of every block of the level.
    #[must_use]
    pub fn block_shape(&self) -> &[u64] {
        &self.block_shape
    }

    /// Return the shape of the block grid.
    #[must_use]
    pub fn grid_shape(&self) -> &[u64] {
        &self.grid_shape
    }

    /// Return the number of elements in a block.
    #[must_use]
    pub const fn block_len(&self) -> usize {
        self.block_len
    }

    /// Return the number of blocks in the level.
    #[must_use]
    pub fn num_blocks(&self) -> u64 {
        self.grid_shape.iter().product()
    }

    /// Return the dimensionality of the level.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.dimensions.len()
    }

    /// Return the mipmap transform of the level.
    #[must_use]
    pub fn mipmap_transform(&self) -> &MipmapTransform {
        &self.mipmap_transform
    }

    /// Returns true if `grid_indices` address a block of the level.
    #[must_use]
    pub fn contains_grid_indices(&self, grid_indices: &[u64]) -> bool {
        grid_indices.len() == self.grid_shape.len()
            && std::iter::zip(grid_indices, &self.grid_shape).all(|(i, g)| i < g)
    }

    /// Return the grid indices of the block containing the element at `indices`.
    ///
    /// Returns [`None`] if `indices` are outside the level.
    #[must_use]
    pub fn grid_indices_of(&self, indices: &[u64]) -> Option<ArrayIndices> {
        if indices.len() != self.dimensions.len()
            || std::iter::zip(indices, &self.dimensions).any(|(i, d)| i >= d)
        {
            return None;
        }
        Some(
            std::iter::zip(indices, &self.block_shape)
                .map(|(i, b)| i / b)
                .collect(),
        )
    }

    /// Return the linearised (C order) offset of the element at `indices` within its block.
    #[must_use]
    pub fn offset_in_block(&self, indices: &[u64]) -> usize {
        let mut offset = 0u64;
        for (&index, &block_size) in izip!(indices, &self.block_shape) {
            offset = offset * block_size + index % block_size;
        }
        usize::try_from(offset).unwrap_or(usize::MAX)
    }

    /// Return the region of the level covered by the block at `grid_indices`.
    ///
    /// Edge blocks may extend beyond the level dimensions.
    #[must_use]
    pub fn block_subset(&self, grid_indices: &[u64]) -> ArraySubset {
        ArraySubset::new_with_ranges(
            &std::iter::zip(grid_indices, &self.block_shape)
                .map(|(i, b)| i * b..(i + 1) * b)
                .collect::<Vec<_>>(),
        )
    }
}
