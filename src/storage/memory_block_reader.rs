use std::collections::HashMap;

use parking_lot::RwLock;

use crate::block::BlockKey;

use super::{BlockReader, Bytes, MaybeBytes, StorageError};

/// An in-memory block reader.
#[derive(Debug, Default)]
pub struct MemoryBlockReader {
    blocks: RwLock<HashMap<BlockKey, Bytes>>,
}

impl MemoryBlockReader {
    /// Create a new empty memory block reader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the encoded bytes of the block at `key`.
    pub fn set(&self, key: BlockKey, value: impl Into<Bytes>) {
        self.blocks.write().insert(key, value.into());
    }

    /// Erase the block at `key`, making it absent.
    pub fn erase(&self, key: &BlockKey) {
        self.blocks.write().remove(key);
    }

    /// Return the number of stored blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    /// Returns true if no blocks are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }
}

impl BlockReader for MemoryBlockReader {
    fn read_block(&self, key: &BlockKey) -> Result<MaybeBytes, StorageError> {
        Ok(self.blocks.read().get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_block_reader() {
        let reader = MemoryBlockReader::new();
        let key = BlockKey::new(0, 0, 0, vec![1, 2, 3]);
        assert!(reader.is_empty());
        assert!(reader.read_block(&key).unwrap().is_none());
        reader.set(key.clone(), vec![1u8, 2, 3]);
        assert_eq!(reader.len(), 1);
        assert_eq!(reader.read_block(&key).unwrap().unwrap(), vec![1u8, 2, 3]);
        reader.erase(&key);
        assert!(reader.read_block(&key).unwrap().is_none());
    }
}
