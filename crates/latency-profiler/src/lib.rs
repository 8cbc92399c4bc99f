pub mod metrics;
pub mod profiler;

pub use metrics::{LatencyStats, MAX_SAMPLES};
pub use profiler::{LatencyProfiler, ScopedTimer};
