//! # mm-engine: Avellaneda-Stoikov Market-Making Engine
//!
//! A real-time market-making engine for crypto book-ticker streams:
//! - Fast frame parsing with a validated scan-ahead decimal path
//! - EWMA volatility estimation over one-step log returns
//! - Avellaneda-Stoikov optimal quoting with precomputed constants
//! - Passive maker-fill simulation and per-symbol P&L tracking
//! - Inventory-proportional spread widening and a P&L kill switch
//! - Batched telemetry rows to an external time-series store

pub mod config;
pub mod utils;

pub use latency_profiler;
pub use market_data;
pub use quote_engine;
pub use risk_manager;
pub use sink;
pub use trading_engine;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.trim().is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "mm-engine");
    }
}
