use crate::metrics::LatencyStats;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Process-wide latency registry keyed by operation name.
///
/// Stats records are created lazily on first `record`. The pipeline is
/// single-threaded, but the registry is internally synchronized so that a
/// parallel ingest path could share it without API changes. Disabling the
/// profiler reduces `record` to one atomic load.
#[derive(Debug)]
pub struct LatencyProfiler {
    stats: RwLock<HashMap<String, LatencyStats>>,
    enabled: AtomicBool,
}

impl LatencyProfiler {
    #[inline]
    pub fn new() -> Self {
        Self {
            stats: RwLock::new(HashMap::new()),
            enabled: AtomicBool::new(true),
        }
    }

    #[inline]
    pub fn record(&self, operation: &str, ns: u64) {
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }

        let mut stats = self.stats.write();
        match stats.get_mut(operation) {
            Some(entry) => entry.record(ns),
            None => {
                let mut entry = LatencyStats::new();
                entry.record(ns);
                stats.insert(operation.to_string(), entry);
            }
        }
    }

    #[inline]
    pub fn get(&self, operation: &str) -> Option<LatencyStats> {
        self.stats.read().get(operation).cloned()
    }

    #[inline]
    pub fn operations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stats.read().keys().cloned().collect();
        names.sort();
        names
    }

    #[inline]
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reset(&self) {
        self.stats.write().clear();
    }

    pub fn report(&self) -> String {
        let stats = self.stats.read();
        if stats.is_empty() {
            return "no latency measurements recorded\n".to_string();
        }

        let mut names: Vec<&String> = stats.keys().collect();
        names.sort();

        let mut out = String::new();
        let _ = writeln!(out, "=== Latency Report ===");
        for name in names {
            let entry = &stats[name];
            let _ = write!(
                out,
                "{}: count={} avg={:.2}us min={:.2}us max={:.2}us",
                name,
                entry.count(),
                entry.avg_ns() / 1_000.0,
                entry.min_ns() as f64 / 1_000.0,
                entry.max_ns() as f64 / 1_000.0,
            );
            if let (Some(p50), Some(p95), Some(p99)) = (
                entry.percentile(0.50),
                entry.percentile(0.95),
                entry.percentile(0.99),
            ) {
                let _ = write!(
                    out,
                    " p50={:.2}us p95={:.2}us p99={:.2}us",
                    p50 as f64 / 1_000.0,
                    p95 as f64 / 1_000.0,
                    p99 as f64 / 1_000.0,
                );
            }
            let _ = writeln!(out);
        }
        out
    }
}

impl Default for LatencyProfiler {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII measurement: records the elapsed time under `operation` on drop.
pub struct ScopedTimer<'a> {
    profiler: &'a LatencyProfiler,
    operation: &'static str,
    start: Instant,
}

impl<'a> ScopedTimer<'a> {
    #[inline]
    pub fn new(profiler: &'a LatencyProfiler, operation: &'static str) -> Self {
        Self {
            profiler,
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        self.profiler
            .record(self.operation, self.start.elapsed().as_nanos() as u64);
    }
}

#[macro_export]
macro_rules! measure {
    ($profiler:expr, $operation:expr, $code:block) => {{
        let _timer = $crate::profiler::ScopedTimer::new($profiler, $operation);
        $code
    }};
}
