use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

impl Side {
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    #[inline]
    pub fn is_buy(self) -> bool {
        matches!(self, Side::Buy)
    }

    #[inline]
    pub fn is_sell(self) -> bool {
        matches!(self, Side::Sell)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct OrderId(u64);

static ORDER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

impl OrderId {
    #[inline]
    pub fn new() -> Self {
        Self(ORDER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTick {
    pub symbol: String,
    pub bid_price: f64,
    pub ask_price: f64,
    pub bid_size: f64,
    pub ask_size: f64,
    pub volatility: f64,
    pub timestamp: DateTime<Utc>,
}

impl MarketTick {
    #[inline]
    pub fn new(symbol: String, bid: f64, ask: f64, bid_size: f64, ask_size: f64) -> Self {
        Self {
            symbol,
            bid_price: bid,
            ask_price: ask,
            bid_size,
            ask_size,
            volatility: 0.0,
            timestamp: Utc::now(),
        }
    }

    #[inline]
    pub fn mid_price(&self) -> f64 {
        (self.bid_price + self.ask_price) / 2.0
    }

    #[inline]
    pub fn spread(&self) -> f64 {
        self.ask_price - self.bid_price
    }

    #[inline]
    pub fn spread_bps(&self) -> f64 {
        (self.spread() / self.mid_price()) * 10_000.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub bid_price: f64,
    pub ask_price: f64,
    pub bid_size: f64,
    pub ask_size: f64,
    pub order_id: OrderId,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    #[inline]
    pub fn new(symbol: String, bid: f64, ask: f64, bid_size: f64, ask_size: f64) -> Self {
        Self {
            symbol,
            bid_price: bid,
            ask_price: ask,
            bid_size,
            ask_size,
            order_id: OrderId::new(),
            timestamp: Utc::now(),
        }
    }

    #[inline]
    pub fn mid_price(&self) -> f64 {
        (self.bid_price + self.ask_price) / 2.0
    }

    #[inline]
    pub fn spread(&self) -> f64 {
        self.ask_price - self.bid_price
    }

    #[inline]
    pub fn spread_bps(&self) -> f64 {
        (self.spread() / self.mid_price()) * 10_000.0
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.bid_price > 0.0
            && self.ask_price > 0.0
            && self.bid_size > 0.0
            && self.ask_size > 0.0
            && self.ask_price > self.bid_price
    }

    #[inline]
    pub fn notional(&self) -> f64 {
        self.bid_price * self.bid_size + self.ask_price * self.ask_size
    }

    #[inline]
    pub fn is_better_bid(&self, market_bid: f64) -> bool {
        self.bid_price > market_bid
    }

    #[inline]
    pub fn is_better_ask(&self, market_ask: f64) -> bool {
        self.ask_price < market_ask
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub symbol: String,
    pub side: Side,
    pub price: f64,
    pub size: f64,
    pub order_id: OrderId,
    /// Negative fee is a maker rebate and increases realized P&L.
    pub fee: f64,
    pub timestamp: DateTime<Utc>,
}

impl Fill {
    #[inline]
    pub fn new(symbol: String, side: Side, price: f64, size: f64, order_id: OrderId, fee: f64) -> Self {
        Self {
            symbol,
            side,
            price,
            size,
            order_id,
            fee,
            timestamp: Utc::now(),
        }
    }

    #[inline]
    pub fn is_buy(&self) -> bool {
        self.side.is_buy()
    }

    #[inline]
    pub fn notional(&self) -> f64 {
        self.price * self.size
    }
}
