//! Array subsets.
//!
//! An [`ArraySubset`] is a rectangular region of an array, used to address regions of a [`VirtualArrayView`](crate::view::VirtualArrayView)
//! and to enumerate the blocks a region intersects.

mod array_subset_iterators;

pub use array_subset_iterators::{BlocksIterator, IndicesIterator};

use derive_more::Display;
use itertools::izip;
use thiserror::Error;

use crate::{ArrayIndices, ArrayShape};

/// An array subset.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Default)]
#[display("start {start:?} shape {shape:?}")]
pub struct ArraySubset {
    /// The start of the array subset.
    start: ArrayIndices,
    /// The shape of the array subset.
    shape: ArrayShape,
}

impl ArraySubset {
    /// Create a new array subset with `shape` starting at the origin.
    #[must_use]
    pub fn new_with_shape(shape: ArrayShape) -> Self {
        Self {
            start: vec![0; shape.len()],
            shape,
        }
    }

    /// Create a new array subset from a list of [`Range`](std::ops::Range)s.
    #[must_use]
    pub fn new_with_ranges(ranges: &[std::ops::Range<u64>]) -> Self {
        let start = ranges.iter().map(|range| range.start).collect();
        let shape = ranges
            .iter()
            .map(|range| range.end.saturating_sub(range.start))
            .collect();
        Self { start, shape }
    }

    /// Create a new array subset.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleDimensionalityError`] if the size of `start` and `shape` do not match.
    pub fn new_with_start_shape(
        start: ArrayIndices,
        shape: ArrayShape,
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() == shape.len() {
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError::new(start.len(), shape.len()))
        }
    }

    /// Create a new array subset from a start and end (exclusive).
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleDimensionalityError`] if the size of `start` and `end` do not match.
    pub fn new_with_start_end_exc(
        start: ArrayIndices,
        end: ArrayIndices,
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() == end.len() {
            let shape = std::iter::zip(&start, end)
                .map(|(&start, end)| end.saturating_sub(start))
                .collect();
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError::new(start.len(), end.len()))
        }
    }

    /// Return the start of the array subset.
    #[must_use]
    pub fn start(&self) -> &[u64] {
        &self.start
    }

    /// Return the shape of the array subset.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the dimensionality of the array subset.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.start.len()
    }

    /// Return the end (exclusive) of the array subset.
    #[must_use]
    pub fn end_exc(&self) -> ArrayIndices {
        std::iter::zip(&self.start, &self.shape)
            .map(|(start, size)| start + size)
            .collect()
    }

    /// Return the number of elements of the array subset.
    ///
    /// Equal to the product of the components of its shape.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Return the number of elements of the array subset as a `usize`.
    ///
    /// Saturates at [`usize::MAX`].
    #[must_use]
    pub fn num_elements_usize(&self) -> usize {
        usize::try_from(self.num_elements()).unwrap_or(usize::MAX)
    }

    /// Returns true if the array subset contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.iter().any(|&size| size == 0)
    }

    /// Returns true if `indices` lie within the array subset.
    #[must_use]
    pub fn contains(&self, indices: &[u64]) -> bool {
        indices.len() == self.dimensionality()
            && izip!(indices, &self.start, &self.shape)
                .all(|(&index, &start, &size)| index >= start && index < start + size)
    }

    /// Return the overlapping subset between this array subset and `subset_other`.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of `subset_other` does not match the dimensionality of this array subset.
    pub fn overlap(&self, subset_other: &Self) -> Result<Self, IncompatibleDimensionalityError> {
        if subset_other.dimensionality() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                subset_other.dimensionality(),
                self.dimensionality(),
            ));
        }
        let mut start = Vec::with_capacity(self.dimensionality());
        let mut shape = Vec::with_capacity(self.dimensionality());
        for (&start_a, &size_a, &start_b, &size_b) in izip!(
            &self.start,
            &self.shape,
            subset_other.start(),
            subset_other.shape(),
        ) {
            let overlap_start = std::cmp::max(start_a, start_b);
            let overlap_end = std::cmp::min(start_a + size_a, start_b + size_b);
            start.push(overlap_start);
            shape.push(overlap_end.saturating_sub(overlap_start));
        }
        Ok(Self { start, shape })
    }

    /// Return this array subset relative to `start`.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleDimensionalityError`] if the length of `start` does not match the dimensionality of this array subset.
    pub fn relative_to(&self, start: &[u64]) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                start.len(),
                self.dimensionality(),
            ));
        }
        Ok(Self {
            start: std::iter::zip(&self.start, start)
                .map(|(a, b)| a.saturating_sub(*b))
                .collect(),
            shape: self.shape.clone(),
        })
    }

    /// Returns true if the array subset is within the bounds of `array_shape`.
    #[must_use]
    pub fn inbounds(&self, array_shape: &[u64]) -> bool {
        self.dimensionality() == array_shape.len()
            && izip!(&self.start, &self.shape, array_shape)
                .all(|(start, size, shape)| start + size <= *shape)
    }

    /// Returns an iterator over the indices of elements within the array subset in C order.
    #[must_use]
    pub fn indices(&self) -> IndicesIterator {
        IndicesIterator::new(self.clone())
    }

    /// Returns an iterator over the blocks with shape `block_shape` intersecting the array subset.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleDimensionalityError`] if `block_shape` does not match the dimensionality of the array subset.
    pub fn blocks(&self, block_shape: &[u64]) -> Result<BlocksIterator, IncompatibleDimensionalityError> {
        BlocksIterator::new(self, block_shape)
    }
}

/// An incompatible dimensionality error.
#[derive(Copy, Clone, Debug, Error)]
#[error("incompatible dimensionality {0}, expected {1}")]
pub struct IncompatibleDimensionalityError(usize, usize);

impl IncompatibleDimensionalityError {
    /// Create a new incompatible dimensionality error.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_subset() {
        assert!(ArraySubset::new_with_start_shape(vec![0, 0], vec![10, 10]).is_ok());
        assert!(ArraySubset::new_with_start_shape(vec![0, 0], vec![10]).is_err());
        assert!(ArraySubset::new_with_start_end_exc(vec![0, 0], vec![10]).is_err());
        let array_subset = ArraySubset::new_with_ranges(&[1..5, 2..4]);
        assert_eq!(array_subset.start(), &[1, 2]);
        assert_eq!(array_subset.shape(), &[4, 2]);
        assert_eq!(array_subset.end_exc(), &[5, 4]);
        assert_eq!(array_subset.num_elements(), 8);
        assert!(array_subset.contains(&[4, 3]));
        assert!(!array_subset.contains(&[5, 3]));
        assert!(!array_subset.contains(&[4]));
        assert!(array_subset.inbounds(&[5, 4]));
        assert!(!array_subset.inbounds(&[5, 3]));
        assert_eq!(array_subset.to_string(), "start [1, 2] shape [4, 2]");
    }

    #[test]
    fn array_subset_overlap() {
        let array_subset0 = ArraySubset::new_with_ranges(&[0..10, 0..10]);
        let array_subset1 = ArraySubset::new_with_ranges(&[5..15, 8..12]);
        let overlap = array_subset0.overlap(&array_subset1).unwrap();
        assert_eq!(overlap, ArraySubset::new_with_ranges(&[5..10, 8..10]));
        assert_eq!(
            overlap.relative_to(&[5, 8]).unwrap(),
            ArraySubset::new_with_ranges(&[0..5, 0..2])
        );
        let disjoint = ArraySubset::new_with_ranges(&[20..30, 0..10]);
        assert!(array_subset0.overlap(&disjoint).unwrap().is_empty());
        assert!(array_subset0
            .overlap(&ArraySubset::new_with_ranges(&[0..1]))
            .is_err());
    }
}
