use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The endianness of each element in an encoded block, either `big` or `little`.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    /// Little endian.
    #[display("little")]
    Little,

    /// Big endian.
    #[display("big")]
    Big,
}

impl Endianness {
    /// Return true if the endianness matches the endianness of the CPU.
    #[must_use]
    pub fn is_native(self) -> bool {
        self == NATIVE_ENDIAN
    }
}

impl Default for Endianness {
    fn default() -> Self {
        NATIVE_ENDIAN
    }
}

/// The endianness of the CPU.
pub const NATIVE_ENDIAN: Endianness = if cfg!(target_endian = "big") {
    Endianness::Big
} else {
    Endianness::Little
};
