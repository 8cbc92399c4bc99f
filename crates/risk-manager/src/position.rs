use crate::symbol::Symbol;
use market_data::Fill;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    pub quantity: f64,
    pub average_price: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub trade_count: u64,
}

impl Position {
    #[inline]
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            quantity: 0.0,
            average_price: 0.0,
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
            trade_count: 0,
        }
    }

    #[inline]
    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }

    #[inline]
    pub fn is_short(&self) -> bool {
        self.quantity < 0.0
    }

    #[inline]
    pub fn is_flat(&self) -> bool {
        self.quantity == 0.0
    }

    #[inline]
    pub fn total_pnl(&self) -> f64 {
        self.realized_pnl + self.unrealized_pnl
    }

    #[inline]
    pub fn exposure(&self) -> f64 {
        (self.quantity * self.average_price).abs()
    }

    pub fn apply_fill(&mut self, fill: &Fill) {
        let old_quantity = self.quantity;
        let old_avg_price = self.average_price;

        if fill.is_buy() {
            self.quantity += fill.size;
        } else {
            self.quantity -= fill.size;
        }

        if old_quantity == 0.0 {
            self.average_price = fill.price;
        } else if (old_quantity > 0.0 && fill.is_buy()) || (old_quantity < 0.0 && !fill.is_buy()) {
            // Extending the position: size-weighted average entry.
            self.average_price = (old_quantity.abs() * old_avg_price + fill.size * fill.price)
                / self.quantity.abs();
        } else {
            // Reducing or flipping.
            let closed = old_quantity.abs().min(fill.size);
            if old_quantity > 0.0 {
                self.realized_pnl += closed * (fill.price - old_avg_price);
            } else {
                self.realized_pnl += closed * (old_avg_price - fill.price);
            }

            if old_quantity.abs() < fill.size {
                // Flipped: the remainder opens the new side at the fill price.
                self.average_price = fill.price;
            }
            // A reduce (full close included) keeps the old average; a flat
            // position's average is meaningless until the next open resets it.
        }

        // Negative fee is a maker rebate and adds to realized P&L.
        self.realized_pnl -= fill.fee;
        self.trade_count += 1;
    }

    #[inline]
    pub fn mark(&mut self, price: f64) {
        if self.quantity > 0.0 {
            self.unrealized_pnl = self.quantity * (price - self.average_price);
        } else if self.quantity < 0.0 {
            self.unrealized_pnl = self.quantity.abs() * (self.average_price - price);
        } else {
            self.unrealized_pnl = 0.0;
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.is_long() {
            "LONG"
        } else if self.is_short() {
            "SHORT"
        } else {
            "FLAT"
        };
        write!(
            f,
            "{} {} qty={:.6} avg=${:.2} realized=${:.2} unrealized=${:.2} total=${:.2}",
            self.symbol,
            direction,
            self.quantity,
            self.average_price,
            self.realized_pnl,
            self.unrealized_pnl,
            self.total_pnl()
        )
    }
}
