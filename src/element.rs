//! Typed elements of a [`DataBlock`].

use crate::{block::DataBlock, data_type::DataType};

/// A primitive element type that can be held in a [`DataBlock`].
pub trait Element:
    bytemuck::Pod + PartialEq + core::fmt::Debug + Send + Sync + 'static
{
    /// The data type corresponding to this element type.
    const DATA_TYPE: DataType;

    /// Borrow the elements of `block` if it holds this element type.
    fn block_slice(block: &DataBlock) -> Option<&[Self]>;

    /// Wrap `elements` in a [`DataBlock`].
    fn into_block(elements: Vec<Self>) -> DataBlock;

    /// Convert the element to [`f64`], possibly losing precision.
    fn to_f64(self) -> f64;
}

macro_rules! impl_element {
    ($type:ty, $variant:ident) => {
        impl Element for $type {
            const DATA_TYPE: DataType = DataType::$variant;

            fn block_slice(block: &DataBlock) -> Option<&[Self]> {
                if let DataBlock::$variant(elements) = block {
                    Some(elements)
                } else {
                    None
                }
            }

            fn into_block(elements: Vec<Self>) -> DataBlock {
                DataBlock::$variant(elements)
            }

            #[allow(clippy::cast_precision_loss, clippy::cast_lossless)]
            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

impl_element!(i8, Int8);
impl_element!(i16, Int16);
impl_element!(i32, Int32);
impl_element!(i64, Int64);
impl_element!(u8, UInt8);
impl_element!(u16, UInt16);
impl_element!(u32, UInt32);
impl_element!(u64, UInt64);
impl_element!(f32, Float32);
impl_element!(f64, Float64);
