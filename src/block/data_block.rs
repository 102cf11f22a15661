use crate::{data_type::DataType, element::Element};

/// Decoded block data: a fixed-length array of one of the supported primitive types.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum DataBlock {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

macro_rules! dispatch {
    ($self:expr, $elements:ident => $body:expr) => {
        match $self {
            DataBlock::Int8($elements) => $body,
            DataBlock::Int16($elements) => $body,
            DataBlock::Int32($elements) => $body,
            DataBlock::Int64($elements) => $body,
            DataBlock::UInt8($elements) => $body,
            DataBlock::UInt16($elements) => $body,
            DataBlock::UInt32($elements) => $body,
            DataBlock::UInt64($elements) => $body,
            DataBlock::Float32($elements) => $body,
            DataBlock::Float64($elements) => $body,
        }
    };
}

impl DataBlock {
    /// Create a block of `len` elements of `data_type`, all equal to zero.
    #[must_use]
    pub fn zeros(data_type: DataType, len: usize) -> Self {
        match data_type {
            DataType::Int8 => Self::Int8(vec![0; len]),
            DataType::Int16 => Self::Int16(vec![0; len]),
            DataType::Int32 => Self::Int32(vec![0; len]),
            DataType::Int64 => Self::Int64(vec![0; len]),
            DataType::UInt8 => Self::UInt8(vec![0; len]),
            DataType::UInt16 => Self::UInt16(vec![0; len]),
            DataType::UInt32 => Self::UInt32(vec![0; len]),
            DataType::UInt64 => Self::UInt64(vec![0; len]),
            DataType::Float32 => Self::Float32(vec![0.0; len]),
            DataType::Float64 => Self::Float64(vec![0.0; len]),
        }
    }

    /// Create a block from typed elements.
    #[must_use]
    pub fn from_elements<T: Element>(elements: Vec<T>) -> Self {
        T::into_block(elements)
    }

    /// Return the data type of the block.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Int8(_) => DataType::Int8,
            Self::Int16(_) => DataType::Int16,
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::UInt8(_) => DataType::UInt8,
            Self::UInt16(_) => DataType::UInt16,
            Self::UInt32(_) => DataType::UInt32,
            Self::UInt64(_) => DataType::UInt64,
            Self::Float32(_) => DataType::Float32,
            Self::Float64(_) => DataType::Float64,
        }
    }

    /// Return the number of elements in the block.
    #[must_use]
    pub fn len(&self) -> usize {
        dispatch!(self, elements => elements.len())
    }

    /// Returns true if the block has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the size of the block data in bytes.
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        self.len() * self.data_type().size()
    }

    /// Return the block data as native endian bytes.
    #[must_use]
    pub fn as_ne_bytes(&self) -> &[u8] {
        dispatch!(self, elements => bytemuck::cast_slice(elements.as_slice()))
    }

    /// Borrow the elements if the block holds elements of type `T`.
    #[must_use]
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::block_slice(self)
    }

    /// Return the element at `index` converted to [`f64`].
    ///
    /// Returns [`None`] if `index` is out of bounds.
    #[must_use]
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        dispatch!(self, elements => elements.get(index).map(|element| element.to_f64()))
    }

    /// Returns true if every element is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.as_ne_bytes().iter().all(|&byte| byte == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_block_zeros() {
        for data_type in DataType::ALL {
            let block = DataBlock::zeros(data_type, 27);
            assert_eq!(block.data_type(), data_type);
            assert_eq!(block.len(), 27);
            assert_eq!(block.size_in_bytes(), 27 * data_type.size());
            assert!(block.is_zero());
        }
    }

    #[test]
    fn data_block_typed_access() {
        let block = DataBlock::from_elements(vec![1u16, 2, 3, 4]);
        assert_eq!(block.data_type(), DataType::UInt16);
        assert_eq!(block.as_slice::<u16>(), Some([1u16, 2, 3, 4].as_slice()));
        assert!(block.as_slice::<i16>().is_none());
        assert_eq!(block.get_f64(2), Some(3.0));
        assert_eq!(block.get_f64(4), None);
        assert!(!block.is_zero());
    }
}
