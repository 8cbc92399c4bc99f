use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Samples kept for percentile queries; the oldest is evicted beyond this.
pub const MAX_SAMPLES: usize = 1_000;

/// Running statistics for one named operation: count, sum, min, max, and a
/// bounded ring of the most recent samples for percentile queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyStats {
    count: u64,
    sum_ns: u64,
    min_ns: u64,
    max_ns: u64,
    samples: VecDeque<u64>,
}

impl LatencyStats {
    #[inline]
    pub fn new() -> Self {
        Self {
            count: 0,
            sum_ns: 0,
            min_ns: u64::MAX,
            max_ns: 0,
            samples: VecDeque::with_capacity(MAX_SAMPLES),
        }
    }

    #[inline]
    pub fn record(&mut self, ns: u64) {
        self.count += 1;
        self.sum_ns += ns;
        self.min_ns = self.min_ns.min(ns);
        self.max_ns = self.max_ns.max(ns);

        if self.samples.len() == MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(ns);
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[inline]
    pub fn sum_ns(&self) -> u64 {
        self.sum_ns
    }

    #[inline]
    pub fn min_ns(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.min_ns
        }
    }

    #[inline]
    pub fn max_ns(&self) -> u64 {
        self.max_ns
    }

    #[inline]
    pub fn avg_ns(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum_ns as f64 / self.count as f64
        }
    }

    #[inline]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Percentile over the retained ring: sorts a copy and returns the
    /// element at `floor(p * n)`. `p` is a fraction in `[0, 1]`.
    pub fn percentile(&self, p: f64) -> Option<u64> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted: Vec<u64> = self.samples.iter().copied().collect();
        sorted.sort_unstable();
        let index = ((p * sorted.len() as f64) as usize).min(sorted.len() - 1);
        Some(sorted[index])
    }

    #[inline]
    pub fn reset(&mut self) {
        self.count = 0;
        self.sum_ns = 0;
        self.min_ns = u64::MAX;
        self.max_ns = 0;
        self.samples.clear();
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}
