use std::sync::atomic::{AtomicU64, Ordering};

use crate::block::DecodeResult;

/// Counters of the activity of a [`BlockLoader`](super::BlockLoader).
///
/// Counters accumulate over the lifetime of the loader, including across close and reopen.
#[derive(Debug, Default)]
pub struct LoaderStatistics {
    hits: AtomicU64,
    misses: AtomicU64,
    decodes: AtomicU64,
    absent: AtomicU64,
    failures: AtomicU64,
    enqueued: AtomicU64,
    dropped: AtomicU64,
}

impl LoaderStatistics {
    /// Create zeroed statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of accesses that found a valid block.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Return the number of accesses that did not find a valid block.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Return the number of block loads, whatever their outcome.
    #[must_use]
    pub fn decodes(&self) -> u64 {
        self.decodes.load(Ordering::Relaxed)
    }

    /// Return the number of loads of absent blocks.
    #[must_use]
    pub fn absent(&self) -> u64 {
        self.absent.load(Ordering::Relaxed)
    }

    /// Return the number of loads that failed to read or decode.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Return the number of fetch tasks enqueued.
    #[must_use]
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    /// Return the number of fetch tasks dropped from a full queue.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decode(&self, result: &DecodeResult) {
        self.decodes.fetch_add(1, Ordering::Relaxed);
        match result {
            DecodeResult::Valid(_) => {}
            DecodeResult::Absent => {
                self.absent.fetch_add(1, Ordering::Relaxed);
            }
            DecodeResult::Failed(_) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub(crate) fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }
}
