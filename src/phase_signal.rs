use std::sync::{Arc, Mutex, MutexGuard, Condvar, PoisonError};

use crate::phase::Phase;

struct Slot {
    phase: Phase,
    // publishes of red and green so far; a waiter that wakes late still sees
    // that its phase came and went
    published: [u64; 2],
}

fn index(phase: Phase) -> usize {
    match phase {
        Phase::Red => 0,
        Phase::Green => 1,
    }
}

/// Single-slot cell holding the latest published phase.
///
/// Each `publish` overwrites the slot and wakes every waiter. A waiter returns
/// once the slot holds its wanted phase, or once that phase has been published
/// since it started waiting, even if the slot moved on before it woke up.
/// Unlike a queue, nothing accumulates, so a waiter can never act on a value
/// published before it started waiting.
#[derive(Clone)]
pub struct PhaseSignal {
    pair: Arc<(Mutex<Slot>, Condvar)>,
}

impl PhaseSignal {
    pub fn new(initial: Phase) -> Self {
        PhaseSignal {
            pair: Arc::new((Mutex::new(Slot { phase: initial, published: [0, 0] }), Condvar::new())),
        }
    }

    pub fn publish(&self, phase: Phase) {
        let (_, cvar) = &*self.pair;
        let mut slot = self.lock();
        slot.phase = phase;
        slot.published[index(phase)] += 1;
        cvar.notify_all();
    }

    pub fn get(&self) -> Phase {
        self.lock().phase
    }

    /// Returns immediately if the slot already holds `wanted`.
    pub fn wait_for(&self, wanted: Phase) {
        let (_, cvar) = &*self.pair;
        let mut slot = self.lock();
        let seen = slot.published[index(wanted)];
        while slot.phase != wanted && slot.published[index(wanted)] == seen {
            slot = cvar.wait(slot).unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        let (lock, _) = &*self.pair;
        lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PhaseSignal {
    fn default() -> Self {
        PhaseSignal::new(Phase::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{index, PhaseSignal};
    use crate::phase::Phase;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn wait_for_current_value_returns_immediately() {
        let signal = PhaseSignal::new(Phase::Green);
        signal.wait_for(Phase::Green);
        assert_eq!(signal.get(), Phase::Green);
    }

    #[test]
    fn publish_releases_every_waiter() {
        let signal = PhaseSignal::default();
        let (tx, rx) = mpsc::channel();

        let handles: Vec<_> = (0..5)
            .map(|id| {
                let signal = signal.clone();
                let tx = tx.clone();
                thread::spawn(move || {
                    signal.wait_for(Phase::Green);
                    tx.send(id).unwrap();
                })
            })
            .collect();
        drop(tx);

        thread::sleep(Duration::from_millis(50));
        signal.publish(Phase::Red);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        signal.publish(Phase::Green);
        let mut released: Vec<i32> = Vec::new();
        for _ in 0..5 {
            released.push(rx.recv_timeout(Duration::from_secs(5)).expect("waiter stuck"));
        }
        released.sort();
        assert_eq!(released, vec![0, 1, 2, 3, 4]);

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn waiter_released_by_green_that_already_turned_red() {
        const WAITERS: usize = 32;

        let signal = PhaseSignal::default();
        let (tx, rx) = mpsc::channel();

        let handles: Vec<_> = (0..WAITERS)
            .map(|_| {
                let signal = signal.clone();
                let tx = tx.clone();
                thread::spawn(move || {
                    signal.wait_for(Phase::Green);
                    tx.send(()).unwrap();
                })
            })
            .collect();
        drop(tx);

        thread::sleep(Duration::from_millis(100));
        {
            // green then red under one lock hold, so no waiter wakes while
            // the slot is green
            let (_, cvar) = &*signal.pair;
            let mut slot = signal.lock();
            slot.phase = Phase::Green;
            slot.published[index(Phase::Green)] += 1;
            cvar.notify_all();
            slot.phase = Phase::Red;
            slot.published[index(Phase::Red)] += 1;
            cvar.notify_all();
        }

        for _ in 0..WAITERS {
            rx.recv_timeout(Duration::from_secs(5)).expect("waiter missed a short green");
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(signal.get(), Phase::Red);
    }
}
