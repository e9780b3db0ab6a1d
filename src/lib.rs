pub mod blocking_queue;
pub use blocking_queue::BlockingQueue;
pub mod countdown_latch;
pub use countdown_latch::CountdownLatch;
pub mod phase;
pub use phase::{AtomicPhase, Phase};
pub mod phase_signal;
pub use phase_signal::PhaseSignal;
pub mod config;
pub use config::{TrafficLightConfig, WaitStrategy};
pub mod traffic_light;
pub use traffic_light::{Cycle, TrafficLight};

mod error;
pub use error::{Error, Result};
