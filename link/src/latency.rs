//! Rolling latency window fed by liveness-probe round trips.

use std::collections::VecDeque;

/// Number of probe samples kept in the window.
pub const LATENCY_WINDOW: usize = 10;

/// Smooths probe round-trip samples into a moving average.
///
/// Holds at most [`LATENCY_WINDOW`] samples; the oldest one is evicted when
/// a new sample arrives at capacity. Written only by the connection state
/// machine's probe-reply path.
#[derive(Debug, Clone)]
pub struct LatencyTracker {
    samples: VecDeque<u64>,
    capacity: usize,
    average: f64,
}

impl Default for LatencyTracker {
    fn default() -> Self {
        Self::with_capacity(LATENCY_WINDOW)
    }
}

impl LatencyTracker {
    /// Tracker with the default window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker keeping `capacity` samples (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            average: 0.0,
        }
    }

    /// Add one round-trip sample and recompute the mean.
    pub fn record(&mut self, sample_ms: u64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample_ms);

        let sum: u64 = self.samples.iter().sum();
        self.average = sum as f64 / self.samples.len() as f64;
    }

    /// Mean of the held samples; `0.0` before the first sample.
    pub fn average(&self) -> f64 {
        self.average
    }

    /// Samples currently held, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = u64> + '_ {
        self.samples.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
