//! Virtual array views.
//!
//! A [`VirtualArrayView`] presents one resolution level of one channel at one timepoint as an n-dimensional array.
//! Element accesses are translated to block accesses on the underlying [`BlockLoader`], so memory usage scales with
//! the blocks touched rather than the size of the level.

use std::sync::Arc;

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rayon_iter_concurrent_limit::iter_concurrent_limit;
use thiserror::Error;

use crate::{
    array_subset::{ArraySubset, IncompatibleDimensionalityError},
    block::{BlockKey, CachedBlock},
    config::global_config,
    data_type::DataType,
    element::Element,
    fetch::{LoadPolicy, Priority},
    loader::{BlockLoader, BlockLoaderError},
    pyramid::{Channel, MipmapTransform, ResolutionLevel},
    ArrayIndices, ArrayShape,
};

/// A virtual array view error.
#[derive(Debug, Error)]
pub enum ViewError {
    /// A block loader error.
    #[error(transparent)]
    BlockLoaderError(#[from] BlockLoaderError),
    /// Array indices outside the view.
    #[error("array indices {_0:?} are out of bounds of shape {_1:?}")]
    InvalidArrayIndices(ArrayIndices, ArrayShape),
    /// An array subset outside the view.
    #[error("array subset {_0} is out of bounds of shape {_1:?}")]
    InvalidArraySubset(ArraySubset, ArrayShape),
    /// The requested element type does not match the data type of the view.
    #[error("got element type {_0}, expected {_1}")]
    IncompatibleElementType(DataType, DataType),
    /// Incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionalityError(#[from] IncompatibleDimensionalityError),
}

/// A view of one resolution level of a channel at a timepoint.
///
/// Created by [`BlockLoader::image`], [`BlockLoader::volatile_image`] or [`BlockLoader::view`].
#[derive(Debug, Clone)]
pub struct VirtualArrayView<'a> {
    loader: &'a BlockLoader,
    channel: Arc<Channel>,
    timepoint: u32,
    level: usize,
    policy: LoadPolicy,
}

impl<'a> VirtualArrayView<'a> {
    /// `level` must be a level of `channel`.
    pub(crate) fn new(
        loader: &'a BlockLoader,
        channel: Arc<Channel>,
        timepoint: u32,
        level: usize,
        policy: LoadPolicy,
    ) -> Self {
        debug_assert!(level < channel.num_levels());
        Self {
            loader,
            channel,
            timepoint,
            level,
            policy,
        }
    }

    fn resolution_level(&self) -> &ResolutionLevel {
        &self.channel.levels()[self.level]
    }

    /// Return the channel.
    #[must_use]
    pub fn channel(&self) -> &Arc<Channel> {
        &self.channel
    }

    /// Return the timepoint.
    #[must_use]
    pub const fn timepoint(&self) -> u32 {
        self.timepoint
    }

    /// Return the resolution level index.
    #[must_use]
    pub const fn level(&self) -> usize {
        self.level
    }

    /// Return the load policy.
    #[must_use]
    pub const fn policy(&self) -> LoadPolicy {
        self.policy
    }

    /// Return the shape of the view.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        self.resolution_level().dimensions()
    }

    /// Return the block shape.
    #[must_use]
    pub fn block_shape(&self) -> &[u64] {
        self.resolution_level().block_shape()
    }

    /// Return the shape of the block grid.
    #[must_use]
    pub fn grid_shape(&self) -> &[u64] {
        self.resolution_level().grid_shape()
    }

    /// Return the dimensionality of the view.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.shape().len()
    }

    /// Return the data type.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.channel.data_type()
    }

    /// Return the transform from view coordinates to channel physical coordinates.
    #[must_use]
    pub fn mipmap_transform(&self) -> &MipmapTransform {
        self.resolution_level().mipmap_transform()
    }

    /// Return the key of the block at `grid_indices`.
    #[must_use]
    pub fn block_key(&self, grid_indices: &[u64]) -> BlockKey {
        BlockKey::new(
            self.channel.id(),
            self.timepoint,
            self.level,
            grid_indices.to_vec(),
        )
    }

    /// Return the grid indices of the block containing the element at `indices`.
    ///
    /// Returns [`None`] if `indices` are outside the view.
    #[must_use]
    pub fn block_indices_of(&self, indices: &[u64]) -> Option<ArrayIndices> {
        self.resolution_level().grid_indices_of(indices)
    }

    /// Return the block at `grid_indices`, resolved with the policy of the view.
    ///
    /// # Errors
    /// Returns [`ViewError::BlockLoaderError`] if `grid_indices` are outside the block grid.
    pub fn block(&self, grid_indices: &[u64]) -> Result<CachedBlock, ViewError> {
        Ok(self
            .loader
            .get(&self.block_key(grid_indices), self.policy)?)
    }

    fn check_element_type<T: Element>(&self) -> Result<(), ViewError> {
        if T::DATA_TYPE == self.data_type() {
            Ok(())
        } else {
            Err(ViewError::IncompatibleElementType(
                T::DATA_TYPE,
                self.data_type(),
            ))
        }
    }

    /// Return the element at `indices`.
    ///
    /// Elements of blocks that are still pending read as zero.
    ///
    /// # Errors
    /// Returns a [`ViewError`] if `indices` are outside the view or `T` does not match the data type of the view.
    pub fn get<T: Element>(&self, indices: &[u64]) -> Result<T, ViewError> {
        self.check_element_type::<T>()?;
        let block = self.block_of(indices)?;
        let offset = self.resolution_level().offset_in_block(indices);
        T::block_slice(block.data())
            .and_then(|elements| elements.get(offset))
            .copied()
            .ok_or_else(|| ViewError::IncompatibleElementType(T::DATA_TYPE, block.data().data_type()))
    }

    /// Return the element at `indices` converted to [`f64`].
    ///
    /// # Errors
    /// Returns a [`ViewError`] if `indices` are outside the view.
    pub fn get_f64(&self, indices: &[u64]) -> Result<f64, ViewError> {
        let block = self.block_of(indices)?;
        let offset = self.resolution_level().offset_in_block(indices);
        block
            .data()
            .get_f64(offset)
            .ok_or_else(|| ViewError::InvalidArrayIndices(indices.to_vec(), self.shape().to_vec()))
    }

    fn block_of(&self, indices: &[u64]) -> Result<CachedBlock, ViewError> {
        let grid_indices = self
            .block_indices_of(indices)
            .ok_or_else(|| ViewError::InvalidArrayIndices(indices.to_vec(), self.shape().to_vec()))?;
        self.block(&grid_indices)
    }

    fn blocks_of(&self, array_subset: &ArraySubset) -> Result<Vec<(ArrayIndices, ArraySubset)>, ViewError> {
        if !array_subset.inbounds(self.shape()) {
            return Err(ViewError::InvalidArraySubset(
                array_subset.clone(),
                self.shape().to_vec(),
            ));
        }
        Ok(array_subset.blocks(self.block_shape())?.collect())
    }

    /// Read the elements of `array_subset` in C order.
    ///
    /// The intersecting blocks are retrieved concurrently, up to the [view concurrent target](crate::config::Config#view-concurrent-target).
    /// Elements of blocks that are still pending read as zero.
    ///
    /// # Errors
    /// Returns a [`ViewError`] if `array_subset` is outside the view or `T` does not match the data type of the view.
    pub fn retrieve_subset_elements<T: Element>(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<Vec<T>, ViewError> {
        self.check_element_type::<T>()?;
        let blocks = self.blocks_of(array_subset)?;
        if blocks.is_empty() {
            return Ok(Vec::new());
        }
        let concurrent_limit = global_config().view_concurrent_target().max(1);
        let retrieve_block = |(grid_indices, block_subset): (ArrayIndices, ArraySubset)| {
            self.block(&grid_indices).map(|block| (block, block_subset))
        };
        let retrieved = iter_concurrent_limit!(concurrent_limit, blocks, map, retrieve_block)
            .collect::<Result<Vec<_>, ViewError>>()?;

        let level = self.resolution_level();
        let mut output = vec![<T as bytemuck::Zeroable>::zeroed(); array_subset.num_elements_usize()];
        for (block, block_subset) in retrieved {
            let elements = T::block_slice(block.data()).ok_or_else(|| {
                ViewError::IncompatibleElementType(T::DATA_TYPE, block.data().data_type())
            })?;
            let overlap = array_subset.overlap(&block_subset)?;
            for indices in overlap.indices() {
                let output_offset = ravel(&indices, array_subset.start(), array_subset.shape());
                output[output_offset] = elements[level.offset_in_block(&indices)];
            }
        }
        Ok(output)
    }

    /// Enqueue every block intersecting `array_subset` for background loading.
    ///
    /// Uses the priority of the view if budgeted, otherwise the priority of its level.
    /// Returns the number of intersecting blocks that are not yet valid.
    ///
    /// # Errors
    /// Returns a [`ViewError`] if `array_subset` is outside the view.
    pub fn prefetch(&self, array_subset: &ArraySubset) -> Result<usize, ViewError> {
        let priority = match self.policy {
            LoadPolicy::Budgeted(priority) => priority,
            LoadPolicy::Blocking => {
                Priority::for_level(self.level, self.loader.pyramid().max_num_levels())
            }
        };
        let mut pending = 0;
        for (grid_indices, _) in self.blocks_of(array_subset)? {
            let block = self
                .loader
                .get(&self.block_key(&grid_indices), LoadPolicy::Budgeted(priority))?;
            if !block.is_valid() {
                pending += 1;
            }
        }
        Ok(pending)
    }
}

/// Return the C order linear offset of `indices` within the region at `start` with `shape`.
fn ravel(indices: &[u64], start: &[u64], shape: &[u64]) -> usize {
    let mut offset = 0u64;
    for ((index, start), size) in indices.iter().zip(start).zip(shape) {
        offset = offset * size + (index - start);
    }
    usize::try_from(offset).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_ravel() {
        assert_eq!(ravel(&[2, 3], &[1, 1], &[4, 5]), 7);
        assert_eq!(ravel(&[1, 1, 1], &[1, 1, 1], &[2, 2, 2]), 0);
        assert_eq!(ravel(&[0, 1, 1], &[0, 0, 0], &[2, 2, 2]), 3);
    }
}
