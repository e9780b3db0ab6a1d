use std::sync::{Arc, Mutex, MutexGuard, Condvar, PoisonError};
use std::collections::VecDeque;

/// Unbounded multi-producer, multi-consumer queue with blocking receive.
///
/// `receive` hands out the most recently sent item first. Consumers that only
/// care about the newest value get it without walking through stale ones;
/// older items stay queued for later calls.
///
/// Clones share the same underlying queue.
pub struct BlockingQueue<T> {
    pair: Arc<(Mutex<VecDeque::<T>>, Condvar)>,
}

impl<T> Clone for BlockingQueue<T> {
    fn clone(&self) -> Self {
        BlockingQueue {
            pair: Arc::clone(&self.pair),
        }
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        BlockingQueue::new()
    }
}

impl<T> BlockingQueue<T> {
    pub fn new() -> Self {
        BlockingQueue {
            pair: Arc::new((Mutex::new(VecDeque::<T>::new()), Condvar::new())),
        }
    }

    /// Appends `value` and wakes at most one blocked receiver.
    pub fn send(&self, value: T) {
        let (_, cvar) = &*self.pair;
        let mut queue = self.lock();
        queue.push_back(value);
        cvar.notify_one();
    }

    /// Blocks until the queue is non-empty, then moves out the newest item.
    pub fn receive(&self) -> T {
        let (_, cvar) = &*self.pair;
        let mut queue = self.lock();
        loop {
            if let Some(value) = queue.pop_back() {
                return value;
            }
            queue = cvar.wait(queue).unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn try_receive(&self) -> Option<T> {
        self.lock().pop_back()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Items are plain values, so a holder that panicked cannot leave the
    // deque half-updated.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        let (lock, _) = &*self.pair;
        lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
