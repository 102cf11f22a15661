use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use parking_lot::{Condvar, Mutex};

use crate::block::{BlockKey, DataBlock};

#[derive(Debug)]
enum EntryState {
    Pending { loading: bool },
    Valid(Arc<DataBlock>),
}

/// The outcome of [`CacheEntry::try_claim`].
#[derive(Debug)]
pub enum EntryClaim {
    /// The caller now owns the load and must [`complete`](CacheEntry::complete) the entry.
    Acquired,
    /// Another thread is loading the block.
    InFlight,
    /// The block is already loaded.
    Loaded(Arc<DataBlock>),
}

/// The cache entry of a block.
///
/// An entry starts pending and becomes valid exactly once.
/// Exactly one thread can claim the load of a pending entry, so concurrent requests for a block converge on a single decode.
#[derive(Debug)]
pub struct CacheEntry {
    key: BlockKey,
    state: Mutex<EntryState>,
    loaded: Condvar,
    enqueued: AtomicBool,
}

impl CacheEntry {
    /// Create a new pending entry for the block at `key`.
    #[must_use]
    pub fn new(key: BlockKey) -> Self {
        Self {
            key,
            state: Mutex::new(EntryState::Pending { loading: false }),
            loaded: Condvar::new(),
            enqueued: AtomicBool::new(false),
        }
    }

    /// Return the key of the block.
    #[must_use]
    pub fn key(&self) -> &BlockKey {
        &self.key
    }

    /// Return the decoded block if the entry is valid.
    #[must_use]
    pub fn valid_block(&self) -> Option<Arc<DataBlock>> {
        match &*self.state.lock() {
            EntryState::Valid(block) => Some(block.clone()),
            EntryState::Pending { .. } => None,
        }
    }

    /// Return the size in bytes of the decoded block, or zero if pending.
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        self.valid_block().map_or(0, |block| block.size_in_bytes())
    }

    /// Attempt to claim the load of the block.
    #[must_use]
    pub fn try_claim(&self) -> EntryClaim {
        let mut state = self.state.lock();
        match &mut *state {
            EntryState::Valid(block) => EntryClaim::Loaded(block.clone()),
            EntryState::Pending { loading: true } => EntryClaim::InFlight,
            EntryState::Pending { loading } => {
                *loading = true;
                EntryClaim::Acquired
            }
        }
    }

    /// Store the decoded block and wake every waiting thread.
    ///
    /// A valid entry is never overwritten.
    pub fn complete(&self, block: Arc<DataBlock>) {
        let mut state = self.state.lock();
        if let EntryState::Pending { .. } = *state {
            *state = EntryState::Valid(block);
            self.loaded.notify_all();
        }
    }

    /// Block the calling thread until the entry is valid and return the decoded block.
    #[must_use]
    pub fn wait(&self) -> Arc<DataBlock> {
        let mut state = self.state.lock();
        loop {
            if let EntryState::Valid(block) = &*state {
                return block.clone();
            }
            self.loaded.wait(&mut state);
        }
    }

    /// Mark the entry as enqueued for fetching.
    ///
    /// Returns true if the entry was not already enqueued.
    pub fn mark_enqueued(&self) -> bool {
        !self.enqueued.swap(true, Ordering::AcqRel)
    }

    /// Clear the enqueued mark, allowing the entry to be enqueued again.
    pub fn clear_enqueued(&self) {
        self.enqueued.store(false, Ordering::Release);
    }

    /// Returns true if the entry is enqueued for fetching.
    #[must_use]
    pub fn is_enqueued(&self) -> bool {
        self.enqueued.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use crate::data_type::DataType;

    use super::*;

    #[test]
    fn cache_entry_claim() {
        let entry = CacheEntry::new(BlockKey::new(0, 0, 0, vec![0]));
        assert!(matches!(entry.try_claim(), EntryClaim::Acquired));
        assert!(matches!(entry.try_claim(), EntryClaim::InFlight));
        entry.complete(Arc::new(DataBlock::from_elements(vec![1u8, 2])));
        assert!(matches!(entry.try_claim(), EntryClaim::Loaded(_)));
        assert_eq!(entry.size_in_bytes(), 2);

        // valid entries are immutable
        entry.complete(Arc::new(DataBlock::zeros(DataType::UInt8, 2)));
        assert_eq!(
            entry.valid_block().unwrap().as_slice::<u8>(),
            Some([1u8, 2].as_slice())
        );
    }

    #[test]
    fn cache_entry_enqueued() {
        let entry = CacheEntry::new(BlockKey::new(0, 0, 0, vec![0]));
        assert!(entry.mark_enqueued());
        assert!(!entry.mark_enqueued());
        assert!(entry.is_enqueued());
        entry.clear_enqueued();
        assert!(entry.mark_enqueued());
    }

    #[test]
    fn cache_entry_wait() {
        let entry = Arc::new(CacheEntry::new(BlockKey::new(0, 0, 0, vec![0])));
        assert!(matches!(entry.try_claim(), EntryClaim::Acquired));
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let entry = entry.clone();
                thread::spawn(move || entry.wait())
            })
            .collect();
        entry.complete(Arc::new(DataBlock::from_elements(vec![7i32; 3])));
        for waiter in waiters {
            assert_eq!(
                waiter.join().unwrap().as_slice::<i32>(),
                Some([7i32; 3].as_slice())
            );
        }
    }
}
