use market_data::{Fill, MarketTick, Quote, Side};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FillConfig {
    /// Quantity filled per passive execution, in base units.
    pub fill_size: f64,
    /// Relative distance to the public book within which a side counts as
    /// competitive. Strict: exactly at the band does not fill.
    pub competitiveness_band: f64,
    /// Tail mass per side of the single uniform draw.
    pub fill_probability: f64,
    /// Maker rebate rate applied as a negative fee.
    pub rebate_rate: f64,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            fill_size: 0.01,
            competitiveness_band: 1e-3,
            fill_probability: 0.05,
            rebate_rate: 1e-4,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FillOutcome {
    pub bid_fill: Option<Fill>,
    pub ask_fill: Option<Fill>,
}

impl FillOutcome {
    #[inline]
    pub fn count(&self) -> u64 {
        self.bid_fill.is_some() as u64 + self.ask_fill.is_some() as u64
    }

    #[inline]
    pub fn fills(self) -> impl Iterator<Item = Fill> {
        self.bid_fill.into_iter().chain(self.ask_fill)
    }
}

/// Passive maker-fill simulator.
///
/// One uniform draw per quoting step feeds two disjoint tails: the bid
/// fills when that side is competitive and `u < p`, the ask when
/// competitive and `u > 1 - p`, so the two sides fire independently and
/// can both fire on one step. Fills execute at the engine-quoted price and
/// carry a maker rebate as a negative fee. The RNG is seeded explicitly so
/// a run replays exactly.
#[derive(Debug)]
pub struct FillSimulator {
    config: FillConfig,
    rng: StdRng,
}

impl FillSimulator {
    #[inline]
    pub fn new(config: FillConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[inline]
    pub fn simulate(&mut self, quote: &Quote, tick: &MarketTick) -> FillOutcome {
        let draw: f64 = self.rng.gen();
        self.simulate_with_draw(quote, tick, draw)
    }

    fn simulate_with_draw(&self, quote: &Quote, tick: &MarketTick, draw: f64) -> FillOutcome {
        let mut outcome = FillOutcome::default();

        let bid_competitive = (quote.bid_price - tick.bid_price).abs() / tick.bid_price
            < self.config.competitiveness_band;
        let ask_competitive = (quote.ask_price - tick.ask_price).abs() / tick.ask_price
            < self.config.competitiveness_band;

        if bid_competitive && draw < self.config.fill_probability {
            outcome.bid_fill = Some(self.fill_at(quote, Side::Buy, quote.bid_price));
        }
        if ask_competitive && draw > 1.0 - self.config.fill_probability {
            outcome.ask_fill = Some(self.fill_at(quote, Side::Sell, quote.ask_price));
        }

        outcome
    }

    #[inline]
    fn fill_at(&self, quote: &Quote, side: Side, price: f64) -> Fill {
        let rebate = price * self.config.fill_size * self.config.rebate_rate;
        Fill::new(
            quote.symbol.clone(),
            side,
            price,
            self.config.fill_size,
            quote.order_id,
            -rebate,
        )
    }

    #[inline]
    pub fn config(&self) -> &FillConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick() -> MarketTick {
        MarketTick::new("BTCUSDT".to_string(), 44990.0, 45010.0, 1.0, 1.0)
    }

    fn competitive_quote() -> Quote {
        // Within 0.1% of both public sides.
        Quote::new("BTCUSDT".to_string(), 44989.0, 45011.0, 1.0, 1.0)
    }

    fn simulator() -> FillSimulator {
        FillSimulator::new(FillConfig::default(), 1)
    }

    #[test]
    fn test_bid_fill_in_lower_tail() {
        let sim = simulator();
        let outcome = sim.simulate_with_draw(&competitive_quote(), &tick(), 0.01);
        assert!(outcome.bid_fill.is_some());
        assert!(outcome.ask_fill.is_none());

        let fill = outcome.bid_fill.unwrap();
        assert_eq!(fill.side, Side::Buy);
        assert_eq!(fill.price, 44989.0);
        assert_eq!(fill.size, 0.01);
    }

    #[test]
    fn test_ask_fill_in_upper_tail() {
        let sim = simulator();
        let outcome = sim.simulate_with_draw(&competitive_quote(), &tick(), 0.99);
        assert!(outcome.bid_fill.is_none());
        let fill = outcome.ask_fill.unwrap();
        assert_eq!(fill.side, Side::Sell);
        assert_eq!(fill.price, 45011.0);
    }

    #[test]
    fn test_middle_draw_fills_nothing() {
        let sim = simulator();
        let outcome = sim.simulate_with_draw(&competitive_quote(), &tick(), 0.5);
        assert_eq!(outcome.count(), 0);
    }

    #[test]
    fn test_tail_boundaries_are_strict() {
        let sim = simulator();
        // u == p is not < p; u == 1 - p is not > 1 - p.
        let outcome = sim.simulate_with_draw(&competitive_quote(), &tick(), 0.05);
        assert!(outcome.bid_fill.is_none());
        let outcome = sim.simulate_with_draw(&competitive_quote(), &tick(), 0.95);
        assert!(outcome.ask_fill.is_none());
    }

    #[test]
    fn test_uncompetitive_quote_never_fills() {
        let sim = simulator();
        // Both sides well outside the 0.1% band.
        let wide = Quote::new("BTCUSDT".to_string(), 44800.0, 45200.0, 1.0, 1.0);
        assert_eq!(sim.simulate_with_draw(&wide, &tick(), 0.0).count(), 0);
        assert_eq!(sim.simulate_with_draw(&wide, &tick(), 0.999).count(), 0);
    }

    #[test]
    fn test_exact_band_boundary_does_not_fill() {
        let sim = simulator();
        let t = MarketTick::new("BTCUSDT".to_string(), 45000.0, 46000.0, 1.0, 1.0);
        // |engine - public| / public == 1e-3 exactly on the bid.
        let at_band = Quote::new("BTCUSDT".to_string(), 45000.0 - 45.0, 46100.0, 1.0, 1.0);
        let outcome = sim.simulate_with_draw(&at_band, &t, 0.0);
        assert!(outcome.bid_fill.is_none());

        // One tick inside the band fills.
        let inside = Quote::new("BTCUSDT".to_string(), 45000.0 - 44.9, 46100.0, 1.0, 1.0);
        let outcome = sim.simulate_with_draw(&inside, &t, 0.0);
        assert!(outcome.bid_fill.is_some());
    }

    #[test]
    fn test_both_sides_can_fill_with_high_probability() {
        let config = FillConfig {
            fill_probability: 0.6,
            ..FillConfig::default()
        };
        let sim = FillSimulator::new(config, 1);
        // Tails overlap: 0.5 is in both.
        let outcome = sim.simulate_with_draw(&competitive_quote(), &tick(), 0.5);
        assert_eq!(outcome.count(), 2);
    }

    #[test]
    fn test_fee_is_a_rebate() {
        let sim = simulator();
        let outcome = sim.simulate_with_draw(&competitive_quote(), &tick(), 0.0);
        let fill = outcome.bid_fill.unwrap();
        let expected = -(44989.0 * 0.01 * 1e-4);
        assert!((fill.fee - expected).abs() < 1e-12);
    }

    #[test]
    fn test_same_seed_replays_identically() {
        let mut a = FillSimulator::new(FillConfig::default(), 99);
        let mut b = FillSimulator::new(FillConfig::default(), 99);
        let quote = competitive_quote();
        let t = tick();
        for _ in 0..200 {
            assert_eq!(a.simulate(&quote, &t).count(), b.simulate(&quote, &t).count());
        }
    }
}
