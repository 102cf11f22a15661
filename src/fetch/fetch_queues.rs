use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use super::{FetchTask, Priority};

#[derive(Debug)]
struct QueuesState {
    queues: Vec<VecDeque<FetchTask>>,
    shutdown: bool,
}

/// A set of bounded last-in first-out queues of fetch tasks, one per [`Priority`].
///
/// [`take`](FetchQueues::take) always serves the most urgent non-empty queue, and the most recently added task within it.
/// When a queue is full, its oldest task is dropped.
#[derive(Debug)]
pub struct FetchQueues {
    state: Mutex<QueuesState>,
    available: Condvar,
    capacity: usize,
}

impl FetchQueues {
    /// Create `num_queues` queues, each holding at most `capacity` tasks.
    ///
    /// There is always at least one queue with a capacity of at least one.
    #[must_use]
    pub fn new(num_queues: usize, capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueuesState {
                queues: (0..num_queues.max(1)).map(|_| VecDeque::new()).collect(),
                shutdown: false,
            }),
            available: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    /// Return the number of queues.
    #[must_use]
    pub fn num_queues(&self) -> usize {
        self.state.lock().queues.len()
    }

    /// Return the capacity of each queue.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add `task` to the queue of `priority`.
    ///
    /// Priorities beyond the least urgent queue are placed in the least urgent queue.
    /// Returns the task that was dropped to make room, or `task` itself if the queues are shut down.
    #[must_use]
    pub fn put(&self, task: FetchTask, priority: Priority) -> Option<FetchTask> {
        let mut state = self.state.lock();
        if state.shutdown {
            return Some(task);
        }
        let last = state.queues.len() - 1;
        let index = usize::try_from(priority.get()).map_or(last, |index| index.min(last));
        let queue = &mut state.queues[index];
        let dropped = if queue.len() >= self.capacity {
            queue.pop_back()
        } else {
            None
        };
        queue.push_front(task);
        drop(state);
        self.available.notify_one();
        dropped
    }

    /// Remove and return the most urgent task, blocking while every queue is empty.
    ///
    /// Returns [`None`] once the queues are [shut down](FetchQueues::shutdown).
    pub fn take(&self) -> Option<FetchTask> {
        let mut state = self.state.lock();
        loop {
            if state.shutdown {
                return None;
            }
            if let Some(task) = state.queues.iter_mut().find_map(VecDeque::pop_front) {
                return Some(task);
            }
            self.available.wait(&mut state);
        }
    }

    /// Remove and return the most urgent task without blocking.
    pub fn try_take(&self) -> Option<FetchTask> {
        self.state
            .lock()
            .queues
            .iter_mut()
            .find_map(VecDeque::pop_front)
    }

    /// Return the total number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().queues.iter().map(VecDeque::len).sum()
    }

    /// Returns true if no tasks are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return every queued task.
    pub fn clear(&self) -> Vec<FetchTask> {
        self.state
            .lock()
            .queues
            .iter_mut()
            .flat_map(|queue| queue.drain(..))
            .collect()
    }

    /// Shut down the queues, waking every thread blocked in [`take`](FetchQueues::take).
    ///
    /// Returns the tasks that were still queued.
    pub fn shutdown(&self) -> Vec<FetchTask> {
        let mut state = self.state.lock();
        state.shutdown = true;
        let pending = state
            .queues
            .iter_mut()
            .flat_map(|queue| queue.drain(..))
            .collect();
        drop(state);
        self.available.notify_all();
        pending
    }

    /// Returns true if the queues are shut down.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.state.lock().shutdown
    }
}
