//! A storage adapter which records performance metrics.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use crate::{
    block::BlockKey,
    storage::{BlockReader, Bytes, MaybeBytes, StorageError},
};

/// The performance metrics storage adapter. Accumulates metrics, such as bytes read and read requests.
///
/// It is intended to aid in testing by allowing the application to validate that metrics (e.g., total reads, absent blocks) match expected values for specific operations.
#[derive(Debug)]
pub struct PerformanceMetricsBlockReader<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    bytes_read: AtomicUsize,
    reads: AtomicUsize,
    absent: AtomicUsize,
    failures: AtomicUsize,
}

impl<TStorage: ?Sized> PerformanceMetricsBlockReader<TStorage> {
    /// Create a new performance metrics storage adapter.
    #[must_use]
    pub fn new(storage: Arc<TStorage>) -> Self {
        Self {
            storage,
            bytes_read: AtomicUsize::default(),
            reads: AtomicUsize::default(),
            absent: AtomicUsize::default(),
            failures: AtomicUsize::default(),
        }
    }

    /// Returns the number of bytes read.
    pub fn bytes_read(&self) -> usize {
        self.bytes_read.load(Ordering::Relaxed)
    }

    /// Returns the number of read requests.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the number of reads of absent blocks.
    pub fn absent(&self) -> usize {
        self.absent.load(Ordering::Relaxed)
    }

    /// Returns the number of failed reads.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }
}

impl<TStorage: ?Sized + BlockReader> BlockReader for PerformanceMetricsBlockReader<TStorage> {
    fn read_block(&self, key: &BlockKey) -> Result<MaybeBytes, StorageError> {
        let value = self.storage.read_block(key);
        match &value {
            Ok(Some(bytes)) => {
                self.bytes_read.fetch_add(Bytes::len(bytes), Ordering::Relaxed);
            }
            Ok(None) => {
                self.absent.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.reads.fetch_add(1, Ordering::Relaxed);
        value
    }

    fn close(&self) {
        self.storage.close();
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::MemoryBlockReader;

    use super::*;

    #[test]
    fn performance_metrics() {
        let store = Arc::new(MemoryBlockReader::new());
        let present = BlockKey::new(0, 0, 0, vec![0]);
        store.set(present.clone(), vec![0u8; 16]);
        let store = PerformanceMetricsBlockReader::new(store);

        store.read_block(&present).unwrap();
        store.read_block(&BlockKey::new(0, 0, 0, vec![1])).unwrap();
        assert_eq!(store.reads(), 2);
        assert_eq!(store.absent(), 1);
        assert_eq!(store.failures(), 0);
        assert_eq!(store.bytes_read(), 16);
    }
}
