//! A storage adapter which prints block reads.

use std::{io::Write, sync::Arc};

use parking_lot::Mutex;

use crate::{
    block::BlockKey,
    storage::{BlockReader, Bytes, MaybeBytes, StorageError},
};

/// The usage log storage adapter. Logs block reads.
///
/// It is intended to aid in debugging and optimising performance by revealing the order in which blocks are fetched.
///
/// ### Example (log to stdout)
/// ```rust
/// # use std::sync::Arc;
/// # use parking_lot::Mutex;
/// # use pyramid_cache::storage::MemoryBlockReader;
/// # use pyramid_cache::storage::storage_adapter::usage_log::UsageLogBlockReader;
/// let store = Arc::new(MemoryBlockReader::new());
/// let log_writer = Arc::new(Mutex::new(std::io::stdout()));
/// let store = Arc::new(UsageLogBlockReader::new(store, log_writer, || {
///     format!("[{:?}] ", std::thread::current().id())
/// }));
/// ```
///
/// Reading blocks through the above [`UsageLogBlockReader`] prints outputs like:
/// ```text
/// [ThreadId(3)] read_block(c0/t0/s2/[0, 0, 0]) -> len=Ok(Some(32768))
/// [ThreadId(4)] read_block(c0/t0/s1/[0, 1, 0]) -> len=Ok(None)
/// ```
pub struct UsageLogBlockReader<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    handle: Arc<Mutex<dyn Write + Send>>,
    prefix_func: fn() -> String,
}

impl<TStorage: ?Sized> core::fmt::Debug for UsageLogBlockReader<TStorage> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        writeln!(f, "usage log")
    }
}

impl<TStorage: ?Sized> UsageLogBlockReader<TStorage> {
    /// Create a new usage log storage adapter.
    pub fn new(
        storage: Arc<TStorage>,
        handle: Arc<Mutex<dyn Write + Send>>,
        prefix_func: fn() -> String,
    ) -> Self {
        Self {
            storage,
            handle,
            prefix_func,
        }
    }
}

impl<TStorage: ?Sized + BlockReader> BlockReader for UsageLogBlockReader<TStorage> {
    fn read_block(&self, key: &BlockKey) -> Result<MaybeBytes, StorageError> {
        let result = self.storage.read_block(key);
        writeln!(
            self.handle.lock(),
            "{}read_block({key}) -> len={:?}",
            (self.prefix_func)(),
            result.as_ref().map(|v| v.as_ref().map(Bytes::len))
        )?;
        result
    }

    fn close(&self) {
        let _ = writeln!(self.handle.lock(), "{}close()", (self.prefix_func)());
        self.storage.close();
    }
}
