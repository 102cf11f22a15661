#[cfg(feature = "gzip")]
use std::io::{Cursor, Read};

use serde::{Deserialize, Serialize};

/// The byte-level compression applied to encoded blocks.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Uncompressed.
    #[default]
    Raw,
    /// Gzip compression.
    Gzip,
    /// Zstandard compression.
    Zstd,
}

impl Compression {
    /// Returns true if blocks with this compression can be decoded with the enabled crate features.
    #[must_use]
    pub const fn is_supported(self) -> bool {
        match self {
            Self::Raw => true,
            Self::Gzip => cfg!(feature = "gzip"),
            Self::Zstd => cfg!(feature = "zstd"),
        }
    }

    /// Decompress `encoded` bytes.
    ///
    /// # Errors
    /// Returns an [`std::io::Error`] if decompression fails or the compression is not enabled.
    pub fn decode(self, encoded: &[u8]) -> std::io::Result<Vec<u8>> {
        match self {
            Self::Raw => Ok(encoded.to_vec()),
            #[cfg(feature = "gzip")]
            Self::Gzip => {
                let mut decoder = flate2::bufread::GzDecoder::new(Cursor::new(encoded));
                let mut out = Vec::new();
                decoder.read_to_end(&mut out)?;
                Ok(out)
            }
            #[cfg(feature = "zstd")]
            Self::Zstd => zstd::decode_all(encoded),
            #[allow(unreachable_patterns)]
            _ => Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                format!("{self:?} compression is not enabled"),
            )),
        }
    }

    /// Compress `decoded` bytes.
    ///
    /// # Errors
    /// Returns an [`std::io::Error`] if compression fails or the compression is not enabled.
    pub fn encode(self, decoded: &[u8]) -> std::io::Result<Vec<u8>> {
        match self {
            Self::Raw => Ok(decoded.to_vec()),
            #[cfg(feature = "gzip")]
            Self::Gzip => {
                let mut encoder = flate2::bufread::GzEncoder::new(
                    Cursor::new(decoded),
                    flate2::Compression::default(),
                );
                let mut out = Vec::new();
                encoder.read_to_end(&mut out)?;
                Ok(out)
            }
            #[cfg(feature = "zstd")]
            Self::Zstd => zstd::encode_all(decoded, 0),
            #[allow(unreachable_patterns)]
            _ => Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                format!("{self:?} compression is not enabled"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compression_raw() {
        let bytes = [1u8, 2, 3];
        assert_eq!(Compression::Raw.decode(&bytes).unwrap(), bytes);
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn compression_gzip() {
        let bytes: Vec<u8> = (0..255).collect();
        let encoded = Compression::Gzip.encode(&bytes).unwrap();
        assert_eq!(Compression::Gzip.decode(&encoded).unwrap(), bytes);
        assert!(Compression::Gzip.decode(&bytes).is_err());
    }

    #[cfg(feature = "zstd")]
    #[test]
    fn compression_zstd() {
        let bytes = vec![7u8; 4096];
        let encoded = Compression::Zstd.encode(&bytes).unwrap();
        assert!(encoded.len() < bytes.len());
        assert_eq!(Compression::Zstd.decode(&encoded).unwrap(), bytes);
    }
}
