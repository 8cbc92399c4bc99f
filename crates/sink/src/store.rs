use crate::rows::{QuoteRow, SessionRecord, StatRow, TickRow};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("store append failed: {0}")]
    AppendFailed(String),
    #[error("store unreachable: {0}")]
    Unreachable(String),
}

/// Contract the engine expects from the external time-series store: batched
/// appends to three row tables plus the session bookkeeping. Appends take
/// whole batches so an implementation can issue one prepared statement per
/// flush over a persistent connection.
pub trait SinkStore: Send + Sync {
    fn append_ticks(&self, rows: &[TickRow]) -> Result<(), SinkError>;
    fn append_quotes(&self, rows: &[QuoteRow]) -> Result<(), SinkError>;
    fn append_stats(&self, rows: &[StatRow]) -> Result<(), SinkError>;
    fn create_session(&self, record: &SessionRecord) -> Result<(), SinkError>;
    fn update_session(&self, record: &SessionRecord) -> Result<(), SinkError>;
}

/// In-memory store for tests and offline inspection. `fail_appends` makes
/// every append return an error, to exercise the transient-failure path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub ticks: Mutex<Vec<TickRow>>,
    pub quotes: Mutex<Vec<QuoteRow>>,
    pub stats: Mutex<Vec<StatRow>>,
    pub sessions: Mutex<Vec<SessionRecord>>,
    tick_batches: Mutex<Vec<usize>>,
    fail_appends: AtomicBool,
}

impl MemoryStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::Relaxed);
    }

    /// Sizes of the tick batches received, in arrival order.
    #[inline]
    pub fn tick_batch_sizes(&self) -> Vec<usize> {
        self.tick_batches.lock().clone()
    }

    fn check(&self) -> Result<(), SinkError> {
        if self.fail_appends.load(Ordering::Relaxed) {
            Err(SinkError::AppendFailed("memory store failure injected".to_string()))
        } else {
            Ok(())
        }
    }
}

impl SinkStore for MemoryStore {
    fn append_ticks(&self, rows: &[TickRow]) -> Result<(), SinkError> {
        self.check()?;
        self.tick_batches.lock().push(rows.len());
        self.ticks.lock().extend_from_slice(rows);
        Ok(())
    }

    fn append_quotes(&self, rows: &[QuoteRow]) -> Result<(), SinkError> {
        self.check()?;
        self.quotes.lock().extend_from_slice(rows);
        Ok(())
    }

    fn append_stats(&self, rows: &[StatRow]) -> Result<(), SinkError> {
        self.check()?;
        self.stats.lock().extend_from_slice(rows);
        Ok(())
    }

    fn create_session(&self, record: &SessionRecord) -> Result<(), SinkError> {
        self.sessions.lock().push(record.clone());
        Ok(())
    }

    fn update_session(&self, record: &SessionRecord) -> Result<(), SinkError> {
        let mut sessions = self.sessions.lock();
        match sessions
            .iter_mut()
            .find(|s| s.session_id == record.session_id)
        {
            Some(existing) => *existing = record.clone(),
            None => sessions.push(record.clone()),
        }
        Ok(())
    }
}

/// Store that logs batch summaries instead of persisting them; the default
/// when no database is wired up.
#[derive(Debug, Default)]
pub struct LoggingStore;

impl LoggingStore {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl SinkStore for LoggingStore {
    fn append_ticks(&self, rows: &[TickRow]) -> Result<(), SinkError> {
        debug!(rows = rows.len(), "tick batch");
        Ok(())
    }

    fn append_quotes(&self, rows: &[QuoteRow]) -> Result<(), SinkError> {
        debug!(rows = rows.len(), "quote batch");
        Ok(())
    }

    fn append_stats(&self, rows: &[StatRow]) -> Result<(), SinkError> {
        debug!(rows = rows.len(), "stat batch");
        Ok(())
    }

    fn create_session(&self, record: &SessionRecord) -> Result<(), SinkError> {
        info!(
            session_id = %record.session_id,
            symbol = %record.symbol,
            duration = record.duration_seconds,
            "session started"
        );
        Ok(())
    }

    fn update_session(&self, record: &SessionRecord) -> Result<(), SinkError> {
        info!(
            session_id = %record.session_id,
            status = %record.status,
            stats = record.final_stats.as_deref().unwrap_or(""),
            "session finished"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::SessionStatus;
    use chrono::Utc;

    fn tick_row() -> TickRow {
        TickRow {
            time: Utc::now(),
            symbol: "BTCUSDT".to_string(),
            bid: 44990.0,
            bid_size: 1.0,
            ask: 45010.0,
            ask_size: 1.0,
            spread: 20.0,
            mid_price: 45000.0,
            session_id: "sim_test".to_string(),
        }
    }

    #[test]
    fn test_memory_store_appends() {
        let store = MemoryStore::new();
        store.append_ticks(&[tick_row(), tick_row()]).unwrap();
        assert_eq!(store.ticks.lock().len(), 2);
        assert_eq!(store.tick_batch_sizes(), vec![2]);
    }

    #[test]
    fn test_memory_store_failure_injection() {
        let store = MemoryStore::new();
        store.set_fail_appends(true);
        assert!(store.append_ticks(&[tick_row()]).is_err());
        assert!(store.ticks.lock().is_empty());

        store.set_fail_appends(false);
        assert!(store.append_ticks(&[tick_row()]).is_ok());
    }

    #[test]
    fn test_session_update_replaces_by_id() {
        let store = MemoryStore::new();
        let mut record = SessionRecord::new("BTCUSDT".to_string(), 60, String::new());
        store.create_session(&record).unwrap();

        record.finish(SessionStatus::Completed, "done".to_string());
        store.update_session(&record).unwrap();

        let sessions = store.sessions.lock();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].status, SessionStatus::Completed);
    }
}
