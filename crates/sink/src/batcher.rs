use crate::rows::{QuoteRow, StatRow, TickRow};
use crate::store::SinkStore;
use std::sync::Arc;
use tracing::warn;

pub const DEFAULT_BATCH_SIZE: usize = 50;

#[derive(Debug)]
struct BatchBuffer<R> {
    rows: Vec<R>,
    target: usize,
}

impl<R> BatchBuffer<R> {
    #[inline]
    fn new(target: usize) -> Self {
        Self {
            rows: Vec::with_capacity(target),
            target,
        }
    }

    /// Pushes a row, handing back the full batch once the target is hit.
    #[inline]
    fn push(&mut self, row: R) -> Option<Vec<R>> {
        self.rows.push(row);
        if self.rows.len() >= self.target {
            Some(std::mem::replace(
                &mut self.rows,
                Vec::with_capacity(self.target),
            ))
        } else {
            None
        }
    }

    #[inline]
    fn drain(&mut self) -> Vec<R> {
        std::mem::take(&mut self.rows)
    }

    #[inline]
    fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Buffers tick, quote, and stat rows per row-type and flushes each type as
/// a single batched append when it reaches the target size, or on explicit
/// `flush_all` at shutdown. A failed flush is logged and its rows dropped;
/// the store is a telemetry sink, not a ledger, so the pipeline continues.
pub struct SinkBatcher {
    store: Arc<dyn SinkStore>,
    ticks: BatchBuffer<TickRow>,
    quotes: BatchBuffer<QuoteRow>,
    stats: BatchBuffer<StatRow>,
    flush_count: u64,
    failed_flushes: u64,
}

impl SinkBatcher {
    #[inline]
    pub fn new(store: Arc<dyn SinkStore>, batch_size: usize) -> Self {
        Self {
            store,
            ticks: BatchBuffer::new(batch_size),
            quotes: BatchBuffer::new(batch_size),
            stats: BatchBuffer::new(batch_size),
            flush_count: 0,
            failed_flushes: 0,
        }
    }

    #[inline]
    pub fn append_tick(&mut self, row: TickRow) {
        if let Some(batch) = self.ticks.push(row) {
            self.flush_result("ticks", self.store.append_ticks(&batch));
        }
    }

    #[inline]
    pub fn append_quote(&mut self, row: QuoteRow) {
        if let Some(batch) = self.quotes.push(row) {
            self.flush_result("quotes", self.store.append_quotes(&batch));
        }
    }

    #[inline]
    pub fn append_stat(&mut self, row: StatRow) {
        if let Some(batch) = self.stats.push(row) {
            self.flush_result("stats", self.store.append_stats(&batch));
        }
    }

    /// Drains every buffer regardless of fill level. Called at shutdown and
    /// on session transitions.
    pub fn flush_all(&mut self) {
        let ticks = self.ticks.drain();
        if !ticks.is_empty() {
            self.flush_result("ticks", self.store.append_ticks(&ticks));
        }
        let quotes = self.quotes.drain();
        if !quotes.is_empty() {
            self.flush_result("quotes", self.store.append_quotes(&quotes));
        }
        let stats = self.stats.drain();
        if !stats.is_empty() {
            self.flush_result("stats", self.store.append_stats(&stats));
        }
    }

    fn flush_result(&mut self, table: &'static str, result: Result<(), crate::store::SinkError>) {
        self.flush_count += 1;
        if let Err(error) = result {
            self.failed_flushes += 1;
            warn!(table, %error, "sink flush failed, dropping batch");
        }
    }

    #[inline]
    pub fn pending_ticks(&self) -> usize {
        self.ticks.len()
    }

    #[inline]
    pub fn pending_quotes(&self) -> usize {
        self.quotes.len()
    }

    #[inline]
    pub fn pending_stats(&self) -> usize {
        self.stats.len()
    }

    #[inline]
    pub fn flush_count(&self) -> u64 {
        self.flush_count
    }

    #[inline]
    pub fn failed_flushes(&self) -> u64 {
        self.failed_flushes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Utc;

    fn tick_row(i: usize) -> TickRow {
        TickRow {
            time: Utc::now(),
            symbol: "BTCUSDT".to_string(),
            bid: 44990.0 + i as f64,
            bid_size: 1.0,
            ask: 45010.0 + i as f64,
            ask_size: 1.0,
            spread: 20.0,
            mid_price: 45000.0 + i as f64,
            session_id: "sim_test".to_string(),
        }
    }

    #[test]
    fn test_flush_at_target_size() {
        let store = Arc::new(MemoryStore::new());
        let mut batcher = SinkBatcher::new(store.clone(), 10);

        for i in 0..9 {
            batcher.append_tick(tick_row(i));
        }
        assert!(store.ticks.lock().is_empty());
        assert_eq!(batcher.pending_ticks(), 9);

        batcher.append_tick(tick_row(9));
        assert_eq!(store.ticks.lock().len(), 10);
        assert_eq!(batcher.pending_ticks(), 0);
    }

    #[test]
    fn test_flush_count_over_many_rows() {
        let store = Arc::new(MemoryStore::new());
        let mut batcher = SinkBatcher::new(store.clone(), 50);

        for i in 0..123 {
            batcher.append_tick(tick_row(i));
        }
        assert_eq!(store.tick_batch_sizes(), vec![50, 50]);
        assert_eq!(batcher.pending_ticks(), 23);

        batcher.flush_all();
        assert_eq!(store.tick_batch_sizes(), vec![50, 50, 23]);
        assert_eq!(store.ticks.lock().len(), 123);
    }

    #[test]
    fn test_rows_preserve_arrival_order() {
        let store = Arc::new(MemoryStore::new());
        let mut batcher = SinkBatcher::new(store.clone(), 5);

        for i in 0..12 {
            batcher.append_tick(tick_row(i));
        }
        batcher.flush_all();

        let ticks = store.ticks.lock();
        for (i, row) in ticks.iter().enumerate() {
            assert_eq!(row.mid_price, 45000.0 + i as f64);
        }
    }

    #[test]
    fn test_failed_flush_drops_batch_and_continues() {
        let store = Arc::new(MemoryStore::new());
        let mut batcher = SinkBatcher::new(store.clone(), 5);

        store.set_fail_appends(true);
        for i in 0..5 {
            batcher.append_tick(tick_row(i));
        }
        assert_eq!(batcher.failed_flushes(), 1);
        assert_eq!(batcher.pending_ticks(), 0);
        assert!(store.ticks.lock().is_empty());

        // The sink recovers once the store does.
        store.set_fail_appends(false);
        for i in 0..5 {
            batcher.append_tick(tick_row(i));
        }
        assert_eq!(store.ticks.lock().len(), 5);
    }

    #[test]
    fn test_flush_all_skips_empty_buffers() {
        let store = Arc::new(MemoryStore::new());
        let mut batcher = SinkBatcher::new(store.clone(), 5);
        batcher.flush_all();
        assert_eq!(batcher.flush_count(), 0);
    }
}
