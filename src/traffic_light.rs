use std::convert::TryFrom;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info, trace};

use crate::blocking_queue::BlockingQueue;
use crate::config::{TrafficLightConfig, WaitStrategy};
use crate::phase::{AtomicPhase, Phase};
use crate::phase_signal::PhaseSignal;
use crate::{Error, Result};

enum Notifier {
    Latest(PhaseSignal),
    Queue(BlockingQueue<Phase>),
}

impl Notifier {
    fn publish(&self, phase: Phase) {
        match self {
            Notifier::Latest(signal) => signal.publish(phase),
            Notifier::Queue(queue) => queue.send(phase),
        }
    }

    fn wait_for(&self, wanted: Phase) {
        match self {
            Notifier::Latest(signal) => signal.wait_for(wanted),
            Notifier::Queue(queue) => loop {
                let phase = queue.receive();
                if phase == wanted {
                    return;
                }
                trace!("skipping {} while waiting for {}", phase, wanted);
            },
        }
    }
}

struct Shared {
    config: TrafficLightConfig,
    seed: u64,
    phase: AtomicPhase,
    notifier: Notifier,
    toggles: AtomicU64,
    started: AtomicBool,
    stop: AtomicBool,
}

impl Shared {
    fn toggle(&self) -> Phase {
        let next = self.phase.load().toggle();
        self.phase.store(next);
        self.toggles.fetch_add(1, Ordering::AcqRel);
        self.notifier.publish(next);
        next
    }

    fn cycle_through_phases(&self) {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let durations = Uniform::new_inclusive(nanos(self.config.min_cycle), nanos(self.config.max_cycle));

        let mut cycle = Duration::from_nanos(durations.sample(&mut rng));
        let mut start = Instant::now();

        while !self.stop.load(Ordering::Acquire) {
            thread::sleep(self.config.poll_quantum);

            let elapsed = start.elapsed();
            if elapsed > cycle {
                let phase = self.toggle();
                debug!("switched to {} after {:?}", phase, elapsed);

                start = Instant::now();
                cycle = Duration::from_nanos(durations.sample(&mut rng));
            }
        }
    }
}

// `validate` caps cycles at `MAX_CYCLE`, which fits in u64 nanoseconds.
fn nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// A traffic light that flips between red and green at random intervals.
///
/// Clones are handles to the same light, so vehicles on other threads can
/// wait on it while the cycling thread runs.
#[derive(Clone)]
pub struct TrafficLight {
    shared: Arc<Shared>,
}

impl TrafficLight {
    pub fn new(config: TrafficLightConfig) -> Result<TrafficLight> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let notifier = match config.wait_strategy {
            WaitStrategy::Latest => Notifier::Latest(PhaseSignal::new(Phase::Red)),
            WaitStrategy::Queue => Notifier::Queue(BlockingQueue::new()),
        };

        Ok(TrafficLight {
            shared: Arc::new(Shared {
                config,
                seed,
                phase: AtomicPhase::new(Phase::Red),
                notifier,
                toggles: AtomicU64::new(0),
                started: AtomicBool::new(false),
                stop: AtomicBool::new(false),
            }),
        })
    }

    /// The validated config the light was built with.
    pub fn config(&self) -> &TrafficLightConfig {
        &self.shared.config
    }

    /// Snapshot of the phase; never blocks.
    pub fn current_phase(&self) -> Phase {
        self.shared.phase.load()
    }

    /// Number of phase changes since `simulate` was called.
    pub fn toggles(&self) -> u64 {
        self.shared.toggles.load(Ordering::Acquire)
    }

    /// Blocks until the light is observed green.
    ///
    /// There is no timeout: if the cycling task is never started, or has been
    /// stopped on red, this waits forever.
    pub fn wait_for_green(&self) {
        self.wait_for(Phase::Green);
    }

    pub fn wait_for(&self, phase: Phase) {
        self.shared.notifier.wait_for(phase);
        trace!("observed {}", phase);
    }

    /// Starts the cycling thread. Can only be called once per light.
    ///
    /// The thread runs until the returned `Cycle` is stopped or dropped, so
    /// the caller must keep the guard alive for as long as the light should
    /// cycle.
    #[must_use = "dropping the Cycle stops the traffic light"]
    pub fn simulate(&self) -> Result<Cycle> {
        if self.shared.started.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyStarted);
        }

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(String::from("traffic-light-cycle"))
            .spawn(move || shared.cycle_through_phases());

        let handle = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                self.shared.started.store(false, Ordering::Release);
                return Err(Error::Spawn(err));
            }
        };

        info!(
            "traffic light cycling every {:?}..={:?}, seed {}",
            self.shared.config.min_cycle, self.shared.config.max_cycle, self.shared.seed
        );

        Ok(Cycle {
            shared: Arc::clone(&self.shared),
            handle: Some(handle),
        })
    }
}

/// Owns the cycling thread started by `TrafficLight::simulate`.
///
/// Dropping it stops and joins the thread.
#[must_use = "dropping the Cycle stops the traffic light"]
pub struct Cycle {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl Cycle {
    pub fn stop(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => return Ok(()),
        };

        self.shared.stop.store(true, Ordering::Release);
        handle.join().map_err(|_| Error::CyclePanicked)?;
        info!(
            "traffic light stopped on {} after {} toggles",
            self.shared.phase.load(),
            self.shared.toggles.load(Ordering::Acquire)
        );
        Ok(())
    }
}

impl Drop for Cycle {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            error!(cause = %err, "failed to stop the cycling thread");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TrafficLight;
    use crate::config::{TrafficLightConfig, WaitStrategy};
    use crate::phase::Phase;
    use crate::Error;
    use std::thread;
    use std::time::Duration;

    fn fast(strategy: WaitStrategy) -> TrafficLightConfig {
        TrafficLightConfig::default()
            .with_cycle(Duration::from_millis(20), Duration::from_millis(40))
            .with_seed(7)
            .with_wait_strategy(strategy)
    }

    #[test]
    fn starts_red() {
        let light = TrafficLight::new(TrafficLightConfig::default()).unwrap();
        assert_eq!(light.current_phase(), Phase::Red);
        assert_eq!(light.toggles(), 0);
        assert_eq!(light.config(), &TrafficLightConfig::default());
    }

    #[test]
    fn rejects_cycles_too_long_to_draw() {
        let config = TrafficLightConfig::default().with_cycle(Duration::MAX, Duration::MAX);
        assert!(matches!(TrafficLight::new(config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn longest_cycle_does_not_panic_the_thread() {
        let config = TrafficLightConfig::default()
            .with_cycle(crate::config::MAX_CYCLE, crate::config::MAX_CYCLE)
            .with_seed(7);
        let light = TrafficLight::new(config).unwrap();
        let cycle = light.simulate().unwrap();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(light.current_phase(), Phase::Red);
        cycle.stop().unwrap();
    }

    #[test]
    fn rejects_invalid_config() {
        let config = TrafficLightConfig::default()
            .with_cycle(Duration::from_secs(6), Duration::from_secs(4));
        assert!(matches!(TrafficLight::new(config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn toggle_alternates_and_publishes() {
        let light = TrafficLight::new(fast(WaitStrategy::Queue)).unwrap();
        assert_eq!(light.shared.toggle(), Phase::Green);
        assert_eq!(light.shared.toggle(), Phase::Red);
        assert_eq!(light.shared.toggle(), Phase::Green);
        assert_eq!(light.current_phase(), Phase::Green);
        assert_eq!(light.toggles(), 3);

        // newest first: the last green satisfies the wait immediately and
        // leaves the older entries queued.
        light.wait_for_green();
        light.wait_for(Phase::Red);
        light.wait_for_green();
    }

    #[test]
    fn simulate_twice_fails() {
        let light = TrafficLight::new(fast(WaitStrategy::Latest)).unwrap();
        let cycle = light.simulate().unwrap();
        assert!(matches!(light.simulate(), Err(Error::AlreadyStarted)));
        assert!(matches!(light.clone().simulate(), Err(Error::AlreadyStarted)));
        cycle.stop().unwrap();
    }

    #[test]
    fn fixed_seed_is_used() {
        let light = TrafficLight::new(fast(WaitStrategy::Latest)).unwrap();
        assert_eq!(light.shared.seed, 7);
    }
}
