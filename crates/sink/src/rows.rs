use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRow {
    pub time: DateTime<Utc>,
    pub symbol: String,
    pub bid: f64,
    pub bid_size: f64,
    pub ask: f64,
    pub ask_size: f64,
    pub spread: f64,
    pub mid_price: f64,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRow {
    pub time: DateTime<Utc>,
    pub symbol: String,
    pub our_bid: f64,
    pub our_ask: f64,
    pub our_spread: f64,
    pub spread_bps: f64,
    pub market_mid: f64,
    pub position: f64,
    pub avg_entry_price: f64,
    pub volatility: f64,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRow {
    pub time: DateTime<Utc>,
    pub symbol: String,
    pub position: f64,
    pub avg_entry_price: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub total_pnl: f64,
    pub fill_count: u64,
    pub quote_count: u64,
    pub fill_rate: f64,
    pub session_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Completed,
    Stopped,
    Error,
}

impl SessionStatus {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
            SessionStatus::Stopped => "stopped",
            SessionStatus::Error => "error",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row in the session table, inserted at startup with status `running`
/// and updated once at shutdown with the end time and final stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub symbol: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: u64,
    pub algorithm_params: String,
    pub final_stats: Option<String>,
    pub status: SessionStatus,
}

impl SessionRecord {
    #[inline]
    pub fn new(symbol: String, duration_seconds: u64, algorithm_params: String) -> Self {
        Self {
            session_id: generate_session_id(),
            symbol,
            start_time: Utc::now(),
            end_time: None,
            duration_seconds,
            algorithm_params,
            final_stats: None,
            status: SessionStatus::Running,
        }
    }

    #[inline]
    pub fn finish(&mut self, status: SessionStatus, final_stats: String) {
        self.end_time = Some(Utc::now());
        self.final_stats = Some(final_stats);
        self.status = status;
    }
}

/// Session ids are unique per run: UTC timestamp down to milliseconds.
#[inline]
pub fn generate_session_id() -> String {
    Utc::now().format("sim_%Y%m%d_%H%M%S_%3f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_shape() {
        let id = generate_session_id();
        assert!(id.starts_with("sim_"));
        // sim_YYYYMMDD_HHMMSS_mmm
        assert_eq!(id.len(), "sim_20250101_120000_000".len());
    }

    #[test]
    fn test_session_lifecycle() {
        let mut record = SessionRecord::new("BTCUSDT".to_string(), 120, "gamma=0.1".to_string());
        assert_eq!(record.status, SessionStatus::Running);
        assert!(record.end_time.is_none());

        record.finish(SessionStatus::Stopped, "total_pnl=-10.2".to_string());
        assert_eq!(record.status, SessionStatus::Stopped);
        assert!(record.end_time.is_some());
        assert!(record.final_stats.as_deref().unwrap().contains("total_pnl"));
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(SessionStatus::Running.as_str(), "running");
        assert_eq!(SessionStatus::Completed.as_str(), "completed");
        assert_eq!(SessionStatus::Stopped.as_str(), "stopped");
        assert_eq!(SessionStatus::Error.as_str(), "error");
    }
}
