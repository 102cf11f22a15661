//! The raw block reader API.
//!
//! A [`BlockReader`] returns the encoded bytes of a block, [`None`] if the block is absent, or a [`StorageError`].
//! It is the only way the cache touches storage, so the crate is agnostic to the layout and format of the underlying store.
//!
//! This module includes an in-memory reader and [storage adapters](storage_adapter) for testing and diagnostics.

mod memory_block_reader;
pub mod storage_adapter;

use std::sync::Arc;

use thiserror::Error;

pub use memory_block_reader::MemoryBlockReader;

use crate::block::BlockKey;

/// The type for bytes returned by a [`BlockReader`].
///
/// An alias for [`bytes::Bytes`].
pub type Bytes = bytes::Bytes;

/// An alias for bytes which may or may not be available.
///
/// A [`BlockReader`] returns [`None`] if a block is absent.
pub type MaybeBytes = Option<Bytes>;

/// [`Arc`] wrapped block reader.
pub type ReadableBlockStorage = Arc<dyn BlockReader>;

/// A storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// The requested method is not supported.
    #[error("{0}")]
    Unsupported(String),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for StorageError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for StorageError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// Reads encoded blocks.
///
/// Readers are shared by all fetcher threads and must tolerate concurrent reads.
pub trait BlockReader: Send + Sync {
    /// Read the encoded bytes of the block at `key`.
    ///
    /// Returns [`None`] if the block is absent.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the read fails.
    fn read_block(&self, key: &BlockKey) -> Result<MaybeBytes, StorageError>;

    /// Release any resources held by the reader.
    ///
    /// Called when the owning loader is closed. A later [`read_block`](BlockReader::read_block) must reacquire them transparently.
    fn close(&self) {}
}
