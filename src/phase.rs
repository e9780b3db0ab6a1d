use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Red,
    Green,
}

impl Phase {
    pub fn toggle(self) -> Phase {
        match self {
            Phase::Red => Phase::Green,
            Phase::Green => Phase::Red,
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            Phase::Red => 0,
            Phase::Green => 1,
        }
    }

    fn from_u8(raw: u8) -> Phase {
        if raw == 0 {
            Phase::Red
        } else {
            Phase::Green
        }
    }
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Red
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Red => f.write_str("red"),
            Phase::Green => f.write_str("green"),
        }
    }
}

/// A `Phase` that can be shared between the cycling thread and readers
/// without a lock.
#[derive(Debug)]
pub struct AtomicPhase(AtomicU8);

impl AtomicPhase {
    pub fn new(phase: Phase) -> Self {
        AtomicPhase(AtomicU8::new(phase.to_u8()))
    }

    pub fn load(&self) -> Phase {
        Phase::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, phase: Phase) {
        self.0.store(phase.to_u8(), Ordering::Release);
    }
}

impl Default for AtomicPhase {
    fn default() -> Self {
        AtomicPhase::new(Phase::default())
    }
}
