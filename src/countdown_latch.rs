use std::sync::{Arc, Mutex, Condvar, PoisonError};

/// One-shot latch: `wait` returns once `countdown` has been called `count` times.
#[derive(Clone)]
pub struct CountdownLatch {
    pair: Arc<(Mutex<usize>, Condvar)>,
}

impl CountdownLatch {
    pub fn new(count: usize) -> CountdownLatch {
        CountdownLatch {
            pair: Arc::new((Mutex::new(count), Condvar::new())),
        }
    }

    pub fn wait(&self) {
        let (lock, cvar) = &*self.pair;
        let mut count = lock.lock().unwrap_or_else(PoisonError::into_inner);
        while *count > 0 {
            count = cvar.wait(count).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Extra calls past zero are ignored.
    pub fn countdown(&self) {
        let (lock, cvar) = &*self.pair;
        let mut count = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if *count == 0 {
            return;
        }
        *count -= 1;
        if *count == 0 {
            cvar.notify_all();
        }
    }

    pub fn count(&self) -> usize {
        let (lock, _) = &*self.pair;
        *lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
