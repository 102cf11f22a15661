//! Block data types.
//!
//! A channel declares exactly one [`DataType`], which selects the [`BlockDecoder`](crate::block::BlockDecoder) used for every block of that channel.

mod endianness;

pub use endianness::{Endianness, NATIVE_ENDIAN};

use derive_more::{Display, From};
use thiserror::Error;

/// A data type.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Display)]
#[rustfmt::skip]
pub enum DataType {
    /// `int8` Integer in `[-2^7, 2^7-1]`.
    #[display("int8")]
    Int8,
    /// `int16` Integer in `[-2^15, 2^15-1]`.
    #[display("int16")]
    Int16,
    /// `int32` Integer in `[-2^31, 2^31-1]`.
    #[display("int32")]
    Int32,
    /// `int64` Integer in `[-2^63, 2^63-1]`.
    #[display("int64")]
    Int64,
    /// `uint8` Integer in `[0, 2^8-1]`.
    #[display("uint8")]
    UInt8,
    /// `uint16` Integer in `[0, 2^16-1]`.
    #[display("uint16")]
    UInt16,
    /// `uint32` Integer in `[0, 2^32-1]`.
    #[display("uint32")]
    UInt32,
    /// `uint64` Integer in `[0, 2^64-1]`.
    #[display("uint64")]
    UInt64,
    /// `float32` IEEE 754 single-precision floating point: sign bit, 8 bits exponent, 23 bits mantissa.
    #[display("float32")]
    Float32,
    /// `float64` IEEE 754 double-precision floating point: sign bit, 11 bits exponent, 52 bits mantissa.
    #[display("float64")]
    Float64,
}

/// An unsupported data type error.
#[derive(Clone, Debug, Error, From)]
#[error("unsupported data type {_0}")]
pub struct UnsupportedDataTypeError(String);

impl UnsupportedDataTypeError {
    /// Return the name of the unsupported data type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl DataType {
    /// Every supported data type.
    pub const ALL: [Self; 10] = [
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::UInt8,
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::Float32,
        Self::Float64,
    ];

    /// Returns the identifier.
    #[must_use]
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    /// Returns the size in bytes of an element.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    /// Returns true if the data type is a floating point type.
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Create a data type from its name.
    ///
    /// Common aliases (e.g. `u16`, `float`) are accepted alongside the identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedDataTypeError`] if the data type is not supported.
    pub fn from_name(name: &str) -> Result<Self, UnsupportedDataTypeError> {
        match name.to_ascii_lowercase().as_str() {
            "int8" | "i8" => Ok(Self::Int8),
            "int16" | "i16" => Ok(Self::Int16),
            "int32" | "i32" => Ok(Self::Int32),
            "int64" | "i64" => Ok(Self::Int64),
            "uint8" | "u8" => Ok(Self::UInt8),
            "uint16" | "u16" => Ok(Self::UInt16),
            "uint32" | "u32" => Ok(Self::UInt32),
            "uint64" | "u64" => Ok(Self::UInt64),
            "float32" | "f32" | "float" => Ok(Self::Float32),
            "float64" | "f64" | "double" => Ok(Self::Float64),
            _ => Err(UnsupportedDataTypeError(name.to_string())),
        }
    }
}

impl serde::Serialize for DataType {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.identifier())
    }
}

impl<'de> serde::Deserialize<'de> for DataType {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let name = String::deserialize(d)?;
        Self::from_name(&name).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_names() {
        for data_type in DataType::ALL {
            assert_eq!(
                DataType::from_name(data_type.identifier()).unwrap(),
                data_type
            );
            assert_eq!(data_type.to_string(), data_type.identifier());
        }
        assert_eq!(DataType::from_name("U16").unwrap(), DataType::UInt16);
        assert_eq!(DataType::from_name("double").unwrap(), DataType::Float64);
    }

    #[test]
    fn data_type_unsupported() {
        let err = DataType::from_name("complex64").unwrap_err();
        assert_eq!(err.name(), "complex64");
        assert_eq!(err.to_string(), "unsupported data type complex64");
    }

    #[test]
    fn data_type_serde() {
        let data_type: DataType = serde_json::from_str(r#""float32""#).unwrap();
        assert_eq!(data_type, DataType::Float32);
        assert_eq!(serde_json::to_string(&DataType::Int64).unwrap(), r#""int64""#);
        assert!(serde_json::from_str::<DataType>(r#""bool""#).is_err());
    }

    #[test]
    fn data_type_size() {
        assert_eq!(DataType::Int8.size(), 1);
        assert_eq!(DataType::UInt16.size(), 2);
        assert_eq!(DataType::Float32.size(), 4);
        assert_eq!(DataType::Float64.size(), 8);
        assert!(DataType::Float64.is_float());
        assert!(!DataType::UInt64.is_float());
    }
}
