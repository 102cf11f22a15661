use std::iter::FusedIterator;

use itertools::izip;

use crate::{ArrayIndices, ArrayShape};

use super::{ArraySubset, IncompatibleDimensionalityError};

/// Iterates over element indices in an array subset in C order.
pub struct IndicesIterator {
    subset: ArraySubset,
    index: u64,
    length: u64,
}

impl IndicesIterator {
    /// Create a new indices iterator.
    #[must_use]
    pub fn new(subset: ArraySubset) -> Self {
        let length = subset.num_elements();
        Self {
            subset,
            index: 0,
            length,
        }
    }
}

impl Iterator for IndicesIterator {
    type Item = ArrayIndices;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.length {
            return None;
        }
        let mut current = self.index;
        let mut indices = vec![0; self.subset.dimensionality()];
        for (out, &subset_start, &subset_size) in izip!(
            indices.iter_mut().rev(),
            self.subset.start.iter().rev(),
            self.subset.shape.iter().rev(),
        ) {
            *out = current % subset_size + subset_start;
            current /= subset_size;
        }
        self.index += 1;
        Some(indices)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.length - self.index).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for IndicesIterator {}

impl FusedIterator for IndicesIterator {}

/// Iterates over the regular sized blocks overlapping an array subset.
/// All blocks have the same size, and may extend over the bounds of the array subset.
///
/// The iterator item is a ([`ArrayIndices`], [`ArraySubset`]) tuple corresponding to the block grid indices and block subset.
pub struct BlocksIterator {
    inner: IndicesIterator,
    block_shape: ArrayShape,
}

impl BlocksIterator {
    /// Create a new blocks iterator.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleDimensionalityError`] if `block_shape` does not match the dimensionality of `subset`.
    pub fn new(
        subset: &ArraySubset,
        block_shape: &[u64],
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if subset.dimensionality() != block_shape.len() {
            return Err(IncompatibleDimensionalityError::new(
                block_shape.len(),
                subset.dimensionality(),
            ));
        }
        let grid_subset = if subset.is_empty() {
            ArraySubset::new_with_shape(vec![0; subset.dimensionality()])
        } else {
            let grid_start = std::iter::zip(subset.start(), block_shape)
                .map(|(s, b)| s / b)
                .collect();
            let grid_end_exc = std::iter::zip(subset.end_exc(), block_shape)
                .map(|(e, b)| (e - 1) / b + 1)
                .collect();
            ArraySubset::new_with_start_end_exc(grid_start, grid_end_exc)?
        };
        Ok(Self {
            inner: IndicesIterator::new(grid_subset),
            block_shape: block_shape.to_vec(),
        })
    }
}

impl Iterator for BlocksIterator {
    type Item = (ArrayIndices, ArraySubset);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|grid_indices| {
            let start = std::iter::zip(&grid_indices, &self.block_shape)
                .map(|(i, b)| i * b)
                .collect();
            let block_subset = ArraySubset {
                start,
                shape: self.block_shape.clone(),
            };
            (grid_indices, block_subset)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for BlocksIterator {}

impl FusedIterator for BlocksIterator {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_subset_iter_indices() {
        let subset = ArraySubset::new_with_ranges(&[1..3, 1..3]);
        let indices: Vec<_> = subset.indices().collect();
        assert_eq!(
            indices,
            vec![vec![1, 1], vec![1, 2], vec![2, 1], vec![2, 2]]
        );
        assert_eq!(subset.indices().len(), 4);
        assert_eq!(
            ArraySubset::new_with_ranges(&[0..0, 0..3]).indices().next(),
            None
        );
    }

    #[test]
    fn array_subset_iter_blocks() {
        let subset = ArraySubset::new_with_ranges(&[1..5, 1..3]);
        let blocks: Vec<_> = subset.blocks(&[2, 2]).unwrap().collect();
        assert_eq!(
            blocks,
            vec![
                (vec![0, 0], ArraySubset::new_with_ranges(&[0..2, 0..2])),
                (vec![0, 1], ArraySubset::new_with_ranges(&[0..2, 2..4])),
                (vec![1, 0], ArraySubset::new_with_ranges(&[2..4, 0..2])),
                (vec![1, 1], ArraySubset::new_with_ranges(&[2..4, 2..4])),
                (vec![2, 0], ArraySubset::new_with_ranges(&[4..6, 0..2])),
                (vec![2, 1], ArraySubset::new_with_ranges(&[4..6, 2..4])),
            ]
        );
        assert!(subset.blocks(&[2]).is_err());
        assert_eq!(
            ArraySubset::new_with_ranges(&[3..3, 0..4])
                .blocks(&[2, 2])
                .unwrap()
                .count(),
            0
        );
    }
}
