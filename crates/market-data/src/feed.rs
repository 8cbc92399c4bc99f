use crossbeam_channel::{bounded, Receiver, Sender};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// A producer of raw book-ticker text frames. The engine consumes frames
/// one at a time and processes each to completion; `None` means the
/// upstream is closed.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub symbol: String,
    pub initial_price: f64,
    /// Daily return volatility of the simulated random walk.
    pub daily_volatility: f64,
    pub spread_bps: f64,
    pub time_step_seconds: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            initial_price: 45_000.0,
            daily_volatility: 0.025,
            spread_bps: 5.0,
            time_step_seconds: 1.0,
        }
    }
}

/// Gaussian-random-walk feed emitting Binance-bookTicker-shaped frames.
///
/// Stands in for the real transport so the full pipeline, parser included,
/// can run end-to-end. Seeded explicitly for reproducible runs.
#[derive(Debug)]
pub struct SimulatedFeed {
    config: FeedConfig,
    price: f64,
    step_sigma: f64,
    rng: StdRng,
    sequence: u64,
}

impl SimulatedFeed {
    #[inline]
    pub fn new(config: FeedConfig, seed: u64) -> Self {
        let step_sigma =
            config.daily_volatility / (86_400.0 / config.time_step_seconds).sqrt();
        Self {
            price: config.initial_price,
            step_sigma,
            config,
            rng: StdRng::seed_from_u64(seed),
            sequence: 0,
        }
    }

    #[inline]
    pub fn current_price(&self) -> f64 {
        self.price
    }

    fn gaussian(&mut self) -> f64 {
        // Box-Muller from two uniform draws.
        let u1: f64 = self.rng.gen_range(f64::MIN_POSITIVE..1.0);
        let u2: f64 = self.rng.gen();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    fn next_book(&mut self) -> (f64, f64, f64, f64) {
        let z = self.gaussian();
        self.price *= (self.step_sigma * z).exp();

        let half_spread = self.price * (self.config.spread_bps / 10_000.0) / 2.0;
        let bid = self.price - half_spread;
        let ask = self.price + half_spread;
        let bid_qty = self.rng.gen_range(0.5..50.0);
        let ask_qty = self.rng.gen_range(0.5..50.0);
        (bid, ask, bid_qty, ask_qty)
    }
}

impl FrameSource for SimulatedFeed {
    fn next_frame(&mut self) -> Option<String> {
        let (bid, ask, bid_qty, ask_qty) = self.next_book();
        self.sequence += 1;
        Some(format!(
            r#"{{"u":{},"s":"{}","b":"{:.8}","B":"{:.8}","a":"{:.8}","A":"{:.8}"}}"#,
            self.sequence, self.config.symbol, bid, bid_qty, ask, ask_qty
        ))
    }
}

/// Frame source backed by a bounded channel, for wiring a real transport
/// onto the engine: the transport thread pushes raw frames, the engine
/// drains them in arrival order.
#[derive(Debug)]
pub struct ChannelSource {
    receiver: Receiver<String>,
}

impl ChannelSource {
    #[inline]
    pub fn with_capacity(capacity: usize) -> (Sender<String>, Self) {
        let (sender, receiver) = bounded(capacity);
        (sender, Self { receiver })
    }
}

impl FrameSource for ChannelSource {
    fn next_frame(&mut self) -> Option<String> {
        self.receiver.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::FrameParser;

    #[test]
    fn test_frames_parse_back() {
        let mut feed = SimulatedFeed::new(FeedConfig::default(), 42);
        let mut parser = FrameParser::new();
        for _ in 0..200 {
            let frame = feed.next_frame().unwrap();
            let tick = parser.parse(&frame).unwrap();
            assert_eq!(tick.symbol, "BTCUSDT");
            assert!(tick.ask_price > tick.bid_price);
            assert!(tick.bid_price > 0.0);
            assert!(tick.bid_size > 0.0 && tick.ask_size > 0.0);
        }
        assert_eq!(parser.frames_rejected(), 0);
    }

    #[test]
    fn test_same_seed_same_walk() {
        let mut a = SimulatedFeed::new(FeedConfig::default(), 7);
        let mut b = SimulatedFeed::new(FeedConfig::default(), 7);
        for _ in 0..50 {
            assert_eq!(a.next_frame(), b.next_frame());
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = SimulatedFeed::new(FeedConfig::default(), 1);
        let mut b = SimulatedFeed::new(FeedConfig::default(), 2);
        let frames_a: Vec<_> = (0..10).map(|_| a.next_frame().unwrap()).collect();
        let frames_b: Vec<_> = (0..10).map(|_| b.next_frame().unwrap()).collect();
        assert_ne!(frames_a, frames_b);
    }

    #[test]
    fn test_channel_source_preserves_order_and_closes() {
        let (sender, mut source) = ChannelSource::with_capacity(8);
        sender.send("one".to_string()).unwrap();
        sender.send("two".to_string()).unwrap();
        drop(sender);

        assert_eq!(source.next_frame().as_deref(), Some("one"));
        assert_eq!(source.next_frame().as_deref(), Some("two"));
        assert_eq!(source.next_frame(), None);
    }
}
