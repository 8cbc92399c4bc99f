use market_data::{MarketTick, Quote};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("ticks and inventories must have the same length ({ticks} vs {inventories})")]
    LengthMismatch { ticks: usize, inventories: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    /// Risk aversion (gamma).
    pub risk_aversion: f64,
    /// Initial volatility (sigma); overridden each tick by the live estimate.
    pub volatility: f64,
    /// Time horizon in seconds (T).
    pub time_horizon: f64,
    /// Inventory penalty / order-flow intensity (kappa).
    pub inventory_penalty: f64,
    /// Quoted size per side.
    pub quote_size: f64,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            risk_aversion: 0.1,
            volatility: 0.05,
            time_horizon: 60.0,
            inventory_penalty: 1.5,
            quote_size: 1.0,
        }
    }
}

/// Avellaneda-Stoikov quote generator.
///
/// Quotes are centered on the inventory-skewed reservation price
/// `r = m - q * gamma * sigma^2 * T` and separated by the optimal spread
/// `gamma * sigma^2 * T + (2 / gamma) * ln(1 + gamma / kappa)`. The three
/// constants that depend only on parameters are precomputed and refreshed
/// on every setter call, so the per-tick path is a handful of multiplies.
#[derive(Debug, Clone)]
pub struct AvellanedaStoikov {
    gamma: f64,
    sigma: f64,
    time_horizon: f64,
    kappa: f64,
    quote_size: f64,

    gamma_sigma_sq: f64,
    log_term: f64,
    two_over_gamma: f64,
}

impl AvellanedaStoikov {
    #[inline]
    pub fn new(config: QuoteConfig) -> Self {
        let mut engine = Self {
            gamma: config.risk_aversion,
            sigma: config.volatility,
            time_horizon: config.time_horizon,
            kappa: config.inventory_penalty,
            quote_size: config.quote_size,
            gamma_sigma_sq: 0.0,
            log_term: 0.0,
            two_over_gamma: 0.0,
        };
        engine.update_constants();
        engine
    }

    #[inline]
    fn update_constants(&mut self) {
        self.gamma_sigma_sq = self.gamma * self.sigma * self.sigma;
        self.log_term = (1.0 + self.gamma / self.kappa).ln();
        self.two_over_gamma = 2.0 / self.gamma;
    }

    #[inline]
    pub fn set_risk_aversion(&mut self, gamma: f64) {
        self.gamma = gamma;
        self.update_constants();
    }

    #[inline]
    pub fn set_volatility(&mut self, sigma: f64) {
        self.sigma = sigma;
        self.update_constants();
    }

    #[inline]
    pub fn set_time_horizon(&mut self, seconds: f64) {
        self.time_horizon = seconds;
        self.update_constants();
    }

    #[inline]
    pub fn set_inventory_penalty(&mut self, kappa: f64) {
        self.kappa = kappa;
        self.update_constants();
    }

    #[inline]
    pub fn risk_aversion(&self) -> f64 {
        self.gamma
    }

    #[inline]
    pub fn volatility(&self) -> f64 {
        self.sigma
    }

    #[inline]
    pub fn time_horizon(&self) -> f64 {
        self.time_horizon
    }

    #[inline]
    pub fn inventory_penalty(&self) -> f64 {
        self.kappa
    }

    #[inline]
    pub fn reservation_price(&self, mid_price: f64, inventory: f64) -> f64 {
        mid_price - inventory * self.gamma_sigma_sq * self.time_horizon
    }

    #[inline]
    pub fn optimal_spread(&self) -> f64 {
        self.gamma_sigma_sq * self.time_horizon + self.two_over_gamma * self.log_term
    }

    #[inline]
    pub fn quotes(&self, tick: &MarketTick, inventory: f64) -> Quote {
        let mid_price = tick.mid_price();
        let reservation = self.reservation_price(mid_price, inventory);
        let half_spread = self.optimal_spread() / 2.0;

        Quote::new(
            tick.symbol.clone(),
            reservation - half_spread,
            reservation + half_spread,
            self.quote_size,
            self.quote_size,
        )
    }

    /// Batch entry point over parallel tick/inventory slices. Semantically
    /// identical to calling [`quotes`](Self::quotes) per element; a length
    /// mismatch is a programmer error surfaced as `QuoteError`.
    pub fn quotes_batch(
        &self,
        ticks: &[MarketTick],
        inventories: &[f64],
    ) -> Result<Vec<Quote>, QuoteError> {
        if ticks.len() != inventories.len() {
            return Err(QuoteError::LengthMismatch {
                ticks: ticks.len(),
                inventories: inventories.len(),
            });
        }

        Ok(ticks
            .iter()
            .zip(inventories)
            .map(|(tick, &inventory)| self.quotes(tick, inventory))
            .collect())
    }
}

impl Default for AvellanedaStoikov {
    fn default() -> Self {
        Self::new(QuoteConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(bid: f64, ask: f64) -> MarketTick {
        MarketTick::new("BTCUSDT".to_string(), bid, ask, 1.0, 1.0)
    }

    #[test]
    fn test_zero_inventory_is_symmetric_around_mid() {
        let engine = AvellanedaStoikov::default();
        let t = tick(44990.0, 45010.0);
        let quote = engine.quotes(&t, 0.0);

        let mid = t.mid_price();
        assert!((quote.mid_price() - mid).abs() < 1e-9);
        assert!(((mid - quote.bid_price) - (quote.ask_price - mid)).abs() < 1e-9);
    }

    #[test]
    fn test_spread_matches_closed_form() {
        let mut engine = AvellanedaStoikov::default();
        engine.set_volatility(0.02);

        let gamma = 0.1;
        let sigma = 0.02f64;
        let t_horizon = 60.0;
        let kappa = 1.5;
        let expected =
            gamma * sigma * sigma * t_horizon + (2.0 / gamma) * (1.0f64 + gamma / kappa).ln();

        let quote = engine.quotes(&tick(45000.0, 45010.0), 0.0);
        assert!((quote.spread() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_quote_midpoint_is_reservation_price() {
        let engine = AvellanedaStoikov::default();
        let t = tick(44995.0, 45015.0);
        for inventory in [-2.0, -0.5, 0.0, 0.5, 2.0] {
            let quote = engine.quotes(&t, inventory);
            let reservation = engine.reservation_price(t.mid_price(), inventory);
            assert!((quote.mid_price() - reservation).abs() < 1e-9);
        }
    }

    #[test]
    fn test_long_inventory_skews_quotes_down() {
        let engine = AvellanedaStoikov::default();
        let t = tick(44990.0, 45010.0);

        let flat = engine.quotes(&t, 0.0);
        let long = engine.quotes(&t, 1.0);
        let short = engine.quotes(&t, -1.0);

        assert!(long.bid_price < flat.bid_price);
        assert!(long.ask_price < flat.ask_price);
        assert!(short.bid_price > flat.bid_price);
        assert!(short.ask_price > flat.ask_price);
        // Skew is symmetric in inventory.
        assert!(((flat.bid_price - long.bid_price) - (short.bid_price - flat.bid_price)).abs() < 1e-9);
    }

    #[test]
    fn test_setters_refresh_constants() {
        let mut engine = AvellanedaStoikov::default();
        let t = tick(44990.0, 45010.0);
        let before = engine.quotes(&t, 0.0).spread();

        engine.set_volatility(0.10);
        let after = engine.quotes(&t, 0.0).spread();
        assert!(after > before);

        engine.set_inventory_penalty(100.0);
        let tight = engine.quotes(&t, 0.0).spread();
        assert!(tight < after);
    }

    #[test]
    fn test_batch_matches_per_tick_path() {
        let engine = AvellanedaStoikov::default();
        let ticks = vec![tick(44990.0, 45010.0), tick(45100.0, 45120.0), tick(44800.0, 44820.0)];
        let inventories = vec![0.0, 0.5, -1.5];

        let batch = engine.quotes_batch(&ticks, &inventories).unwrap();
        assert_eq!(batch.len(), 3);
        for (i, quote) in batch.iter().enumerate() {
            let single = engine.quotes(&ticks[i], inventories[i]);
            assert!((quote.bid_price - single.bid_price).abs() < 1e-12);
            assert!((quote.ask_price - single.ask_price).abs() < 1e-12);
        }
    }

    #[test]
    fn test_batch_length_mismatch_is_an_error() {
        let engine = AvellanedaStoikov::default();
        let ticks = vec![tick(44990.0, 45010.0)];
        let err = engine.quotes_batch(&ticks, &[0.0, 1.0]).unwrap_err();
        assert!(matches!(err, QuoteError::LengthMismatch { ticks: 1, inventories: 2 }));
    }

    #[test]
    fn test_batch_empty_input_is_empty_output() {
        let engine = AvellanedaStoikov::default();
        assert!(engine.quotes_batch(&[], &[]).unwrap().is_empty());
    }
}
