use std::time::Duration;

use crate::{Error, Result};

/// How `wait_for_green` learns about phase changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Waiters block on a single slot holding the latest phase. Every waiter
    /// blocked across a change to the wanted phase is released.
    Latest,
    /// Every change is pushed into a `BlockingQueue`; waiters drain it newest
    /// first and each pushed value is seen by one waiter only.
    Queue,
}

impl Default for WaitStrategy {
    fn default() -> Self {
        WaitStrategy::Latest
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrafficLightConfig {
    /// Lower bound of the cycle duration.
    pub min_cycle: Duration,
    /// Upper bound of the cycle duration, inclusive.
    pub max_cycle: Duration,
    /// Sleep between two timing checks of the cycling loop.
    pub poll_quantum: Duration,
    /// Fixed RNG seed. `None` draws one from the OS when the light is built.
    pub seed: Option<u64>,
    pub wait_strategy: WaitStrategy,
}

impl Default for TrafficLightConfig {
    fn default() -> Self {
        TrafficLightConfig {
            min_cycle: Duration::from_secs(4),
            max_cycle: Duration::from_secs(6),
            poll_quantum: Duration::from_millis(1),
            seed: None,
            wait_strategy: WaitStrategy::default(),
        }
    }
}

impl TrafficLightConfig {
    /// Builds a default config with the cycle bounds given in seconds.
    pub fn from_seconds(min_seconds: f64, max_seconds: f64) -> Result<Self> {
        let config = TrafficLightConfig {
            min_cycle: seconds("min_seconds", min_seconds)?,
            max_cycle: seconds("max_seconds", max_seconds)?,
            ..TrafficLightConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_cycle(mut self, min_cycle: Duration, max_cycle: Duration) -> Self {
        self.min_cycle = min_cycle;
        self.max_cycle = max_cycle;
        self
    }

    pub fn with_poll_quantum(mut self, poll_quantum: Duration) -> Self {
        self.poll_quantum = poll_quantum;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_wait_strategy(mut self, wait_strategy: WaitStrategy) -> Self {
        self.wait_strategy = wait_strategy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_cycle > self.max_cycle {
            return Err(Error::InvalidConfig(format!(
                "min cycle {:?} is greater than max cycle {:?}",
                self.min_cycle, self.max_cycle
            )));
        }
        if self.max_cycle.is_zero() {
            return Err(Error::InvalidConfig(String::from("max cycle must be positive")));
        }
        if self.poll_quantum.is_zero() {
            return Err(Error::InvalidConfig(String::from("poll quantum must be positive")));
        }
        // cycle durations are drawn as u64 nanoseconds
        if self.max_cycle > MAX_CYCLE {
            return Err(Error::InvalidConfig(format!(
                "max cycle {:?} is longer than {:?}",
                self.max_cycle, MAX_CYCLE
            )));
        }
        Ok(())
    }
}

/// Longest cycle the cycling thread can draw, about 584 years.
pub const MAX_CYCLE: Duration = Duration::from_nanos(u64::MAX);

fn seconds(name: &str, value: f64) -> Result<Duration> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::InvalidConfig(format!(
            "{} must be a finite, non-negative number of seconds, got {}",
            name, value
        )));
    }
    Duration::try_from_secs_f64(value).map_err(|err| {
        Error::InvalidConfig(format!("{} of {} seconds: {}", name, value, err))
    })
}
