//! Artificial latency injected before store access.
//!
//! Front ends use it to exercise loading states; tests swap in [`NoLatency`].

use rand::Rng;
use std::thread;
use std::time::Duration;

pub const DEFAULT_MIN_MS: u64 = 300;
pub const DEFAULT_MAX_MS: u64 = 500;

pub trait LatencyHook: Send + Sync {
    fn pause(&self);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoLatency;

impl LatencyHook for NoLatency {
    fn pause(&self) {}
}

/// Sleeps for a uniformly distributed duration in `[min, max)`.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedLatency {
    min: Duration,
    max: Duration,
}

impl SimulatedLatency {
    /// Bounds are swapped if given in the wrong order.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            SimulatedLatency { min, max }
        } else {
            SimulatedLatency { min: max, max: min }
        }
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let nanos = rand::rng().random_range(self.min.as_nanos()..self.max.as_nanos());
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

impl Default for SimulatedLatency {
    fn default() -> Self {
        Self::from_millis(DEFAULT_MIN_MS, DEFAULT_MAX_MS)
    }
}

impl LatencyHook for SimulatedLatency {
    fn pause(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tracing::trace!(delay_ms = delay.as_millis() as u64, "simulated latency");
            thread::sleep(delay);
        }
    }
}
