use tracing::{trace, warn};

use crate::{
    data_type::{DataType, Endianness},
    element::Element,
    storage::{MaybeBytes, StorageError},
};

use super::{BlockKey, Compression, DataBlock};

/// The outcome of decoding a block.
///
/// [`Absent`](DecodeResult::Absent) and [`Failed`](DecodeResult::Failed) both resolve to a zero-filled block,
/// but remain distinguishable for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeResult {
    /// The block was decoded.
    Valid(DataBlock),
    /// The block is not present in the store (a sparse or empty region).
    Absent,
    /// The block could not be read or decoded.
    Failed(String),
}

impl DecodeResult {
    /// Returns true if the block was decoded.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Returns true if the block is absent.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns true if reading or decoding the block failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Convert into a block, substituting a zero-filled block of `len` elements of `data_type` if absent or failed.
    #[must_use]
    pub fn into_block(self, data_type: DataType, len: usize) -> DataBlock {
        match self {
            Self::Valid(block) => block,
            Self::Absent | Self::Failed(_) => DataBlock::zeros(data_type, len),
        }
    }
}

type DecodeFn = fn(&[u8], usize, Endianness) -> Result<DataBlock, String>;

/// Decodes raw block bytes into a [`DataBlock`] of a fixed data type.
///
/// A decoder is selected once per channel from its declared data type and reused for every block of the channel.
#[derive(Clone, Copy)]
pub struct BlockDecoder {
    data_type: DataType,
    endianness: Endianness,
    compression: Compression,
    decode_fn: DecodeFn,
}

impl core::fmt::Debug for BlockDecoder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BlockDecoder")
            .field("data_type", &self.data_type)
            .field("endianness", &self.endianness)
            .field("compression", &self.compression)
            .finish_non_exhaustive()
    }
}

fn decode_elements<T: Element>(
    bytes: &[u8],
    len: usize,
    endianness: Endianness,
) -> Result<DataBlock, String> {
    let element_size = core::mem::size_of::<T>();
    let expected = len * element_size;
    if bytes.len() != expected {
        return Err(format!(
            "got block with {} bytes, expected {expected}",
            bytes.len()
        ));
    }
    let mut elements: Vec<T> = bytemuck::pod_collect_to_vec(bytes);
    if element_size > 1 && !endianness.is_native() {
        bytemuck::cast_slice_mut::<T, u8>(&mut elements)
            .chunks_exact_mut(element_size)
            .for_each(<[u8]>::reverse);
    }
    Ok(T::into_block(elements))
}

impl BlockDecoder {
    /// Create a new block decoder for `data_type`.
    #[must_use]
    pub fn new(data_type: DataType, endianness: Endianness, compression: Compression) -> Self {
        let decode_fn: DecodeFn = match data_type {
            DataType::Int8 => decode_elements::<i8>,
            DataType::Int16 => decode_elements::<i16>,
            DataType::Int32 => decode_elements::<i32>,
            DataType::Int64 => decode_elements::<i64>,
            DataType::UInt8 => decode_elements::<u8>,
            DataType::UInt16 => decode_elements::<u16>,
            DataType::UInt32 => decode_elements::<u32>,
            DataType::UInt64 => decode_elements::<u64>,
            DataType::Float32 => decode_elements::<f32>,
            DataType::Float64 => decode_elements::<f64>,
        };
        Self {
            data_type,
            endianness,
            compression,
            decode_fn,
        }
    }

    /// Return the data type of decoded blocks.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Return the endianness of encoded blocks.
    #[must_use]
    pub const fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Return the compression of encoded blocks.
    #[must_use]
    pub const fn compression(&self) -> Compression {
        self.compression
    }

    /// Decode the result of reading the block `key` into a block of `len` elements.
    ///
    /// A read error or undecodable block is logged here, once per call.
    #[must_use]
    pub fn decode(
        &self,
        key: &BlockKey,
        raw: Result<MaybeBytes, StorageError>,
        len: usize,
    ) -> DecodeResult {
        match raw {
            Ok(None) => {
                trace!(block = %key, "block absent");
                DecodeResult::Absent
            }
            Ok(Some(encoded)) => {
                let decoded = self
                    .compression
                    .decode(&encoded)
                    .map_err(|err| err.to_string())
                    .and_then(|bytes| (self.decode_fn)(&bytes, len, self.endianness));
                match decoded {
                    Ok(block) => {
                        trace!(block = %key, bytes = encoded.len(), "block decoded");
                        DecodeResult::Valid(block)
                    }
                    Err(reason) => {
                        warn!(block = %key, %reason, "block decode failed, substituting zeros");
                        DecodeResult::Failed(reason)
                    }
                }
            }
            Err(err) => {
                warn!(block = %key, error = %err, "block read failed, substituting zeros");
                DecodeResult::Failed(err.to_string())
            }
        }
    }
}
