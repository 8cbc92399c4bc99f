use crate::position::Position;
use crate::symbol::{Symbol, SYMBOL_COUNT};
use market_data::Fill;
use std::fmt::Write as _;
use tracing::debug;

/// Per-symbol position table with aggregate realized/unrealized P&L.
///
/// The symbol universe is small and fixed, so positions live in a flat
/// array indexed by [`Symbol`] and the aggregates are recomputed by summing
/// the table after each update. Fills and marks for unknown symbols are
/// dropped and counted, never given a slot.
#[derive(Debug, Clone)]
pub struct PnlTracker {
    positions: [Position; SYMBOL_COUNT],
    realized_pnl: f64,
    unrealized_pnl: f64,
    fill_count: u64,
    dropped: u64,
}

impl PnlTracker {
    #[inline]
    pub fn new() -> Self {
        Self {
            positions: Symbol::ALL.map(Position::new),
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
            fill_count: 0,
            dropped: 0,
        }
    }

    pub fn update_fill(&mut self, fill: &Fill) {
        let Some(symbol) = Symbol::parse(&fill.symbol) else {
            self.dropped += 1;
            debug!(symbol = %fill.symbol, "dropping fill for unknown symbol");
            return;
        };

        self.positions[symbol.index()].apply_fill(fill);
        self.fill_count += 1;

        self.realized_pnl = self.positions.iter().map(|p| p.realized_pnl).sum();
    }

    pub fn update_market_price(&mut self, symbol: &str, price: f64) {
        let Some(symbol) = Symbol::parse(symbol) else {
            self.dropped += 1;
            return;
        };
        self.mark(symbol, price);
    }

    pub fn mark(&mut self, symbol: Symbol, price: f64) {
        self.positions[symbol.index()].mark(price);
        self.unrealized_pnl = self.positions.iter().map(|p| p.unrealized_pnl).sum();
    }

    #[inline]
    pub fn position(&self, symbol: Symbol) -> &Position {
        &self.positions[symbol.index()]
    }

    #[inline]
    pub fn position_by_name(&self, symbol: &str) -> Option<&Position> {
        Symbol::parse(symbol).map(|s| self.position(s))
    }

    #[inline]
    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    #[inline]
    pub fn unrealized_pnl(&self) -> f64 {
        self.unrealized_pnl
    }

    #[inline]
    pub fn total_pnl(&self) -> f64 {
        self.realized_pnl + self.unrealized_pnl
    }

    #[inline]
    pub fn fill_count(&self) -> u64 {
        self.fill_count
    }

    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== P&L Summary ===");
        let _ = writeln!(out, "Realized P&L:   ${:.2}", self.realized_pnl);
        let _ = writeln!(out, "Unrealized P&L: ${:.2}", self.unrealized_pnl);
        let _ = writeln!(out, "Total P&L:      ${:.2}", self.total_pnl());
        for position in &self.positions {
            if !position.is_flat() || position.realized_pnl != 0.0 {
                let _ = writeln!(out, "  {}", position);
            }
        }
        out
    }
}

impl Default for PnlTracker {
    fn default() -> Self {
        Self::new()
    }
}
