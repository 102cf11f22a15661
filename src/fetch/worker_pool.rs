use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use tracing::{debug, trace, warn};

use super::{FetchQueues, FetchTask};

struct LiveWorker(Arc<AtomicUsize>);

impl Drop for LiveWorker {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A fixed set of threads loading the tasks of a [`FetchQueues`].
///
/// Each worker repeatedly takes the most urgent task and passes it to the load function, until the queues are shut down.
/// A panicking load does not stop the worker.
#[derive(Debug)]
pub struct WorkerPool {
    queues: Arc<FetchQueues>,
    handles: Vec<JoinHandle<()>>,
    live_workers: Arc<AtomicUsize>,
}

impl WorkerPool {
    /// Start `num_workers` threads named `block-fetcher-{i}` serving `queues` with `load`.
    ///
    /// With zero workers, tasks accumulate in `queues` until they are cleared or shut down.
    ///
    /// # Errors
    /// Returns an [`std::io::Error`] if a thread cannot be spawned, after stopping any threads already started.
    pub fn new<F>(num_workers: usize, queues: Arc<FetchQueues>, load: F) -> std::io::Result<Self>
    where
        F: Fn(FetchTask) + Send + Sync + 'static,
    {
        let load = Arc::new(load);
        let mut pool = Self {
            queues,
            handles: Vec::with_capacity(num_workers),
            live_workers: Arc::new(AtomicUsize::new(0)),
        };
        for i in 0..num_workers {
            let queues = pool.queues.clone();
            let load = load.clone();
            pool.live_workers.fetch_add(1, Ordering::AcqRel);
            let live = LiveWorker(pool.live_workers.clone());
            let spawned = thread::Builder::new()
                .name(format!("block-fetcher-{i}"))
                .spawn(move || {
                    let _live = live;
                    trace!("block fetcher started");
                    while let Some(task) = queues.take() {
                        let key = task.key().clone();
                        if panic::catch_unwind(AssertUnwindSafe(|| load(task))).is_err() {
                            warn!(block = %key, "block fetcher recovered from a panicking load");
                        }
                    }
                    trace!("block fetcher stopped");
                });
            match spawned {
                Ok(handle) => pool.handles.push(handle),
                Err(err) => {
                    pool.shutdown();
                    return Err(err);
                }
            }
        }
        debug!(workers = num_workers, "worker pool started");
        Ok(pool)
    }

    /// Return the number of workers that have not exited.
    #[must_use]
    pub fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::Acquire)
    }

    /// Return the queues served by the pool.
    #[must_use]
    pub fn queues(&self) -> &Arc<FetchQueues> {
        &self.queues
    }

    /// Shut down the queues and wait for every worker to exit.
    ///
    /// Tasks already being loaded run to completion, queued tasks are returned.
    pub fn shutdown(&mut self) -> Vec<FetchTask> {
        let pending = self.queues.shutdown();
        let num_workers = self.handles.len();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                debug!("block fetcher panicked");
            }
        }
        if num_workers > 0 {
            debug!(workers = num_workers, "worker pool stopped");
        }
        pending
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
