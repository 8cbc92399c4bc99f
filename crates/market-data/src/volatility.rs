/// Annualization factor for one-step variance, assuming one-second
/// inter-arrival of ticks: 252 trading days of 86,400 seconds. Callers
/// feeding slower streams get proportionally overstated volatility.
pub const SECONDS_PER_YEAR: f64 = 252.0 * 86_400.0;

/// EWMA estimator of annualized volatility from one-step log returns.
///
/// Update rule: `v_t = alpha * r_t^2 + (1 - alpha) * v_{t-1}` with
/// `r_t = ln(p_t / p_{t-1})`. Reported volatility is
/// `max(floor, sqrt(v_t * SECONDS_PER_YEAR))`. The first valid price only
/// latches the return baseline; non-positive or non-finite prices are
/// skipped without touching any state. Deterministic for a given input
/// sequence.
#[derive(Debug, Clone)]
pub struct EwmaVolatility {
    alpha: f64,
    floor: f64,
    current_vol: f64,
    ewma_variance: f64,
    last_price: f64,
    initialized: bool,
    updates: u64,
}

impl EwmaVolatility {
    #[inline]
    pub fn new(alpha: f64, initial_vol: f64, floor: f64) -> Self {
        Self {
            alpha,
            floor,
            current_vol: initial_vol,
            ewma_variance: 0.0,
            last_price: 0.0,
            initialized: false,
            updates: 0,
        }
    }

    #[inline]
    pub fn update(&mut self, price: f64) {
        if !(price > 0.0) || !price.is_finite() {
            return;
        }

        if !self.initialized {
            self.last_price = price;
            self.initialized = true;
            return;
        }

        let log_return = (price / self.last_price).ln();
        let variance = log_return * log_return;
        self.ewma_variance = self.alpha * variance + (1.0 - self.alpha) * self.ewma_variance;

        self.current_vol = (self.ewma_variance * SECONDS_PER_YEAR).sqrt().max(self.floor);

        self.last_price = price;
        self.updates += 1;
    }

    #[inline]
    pub fn volatility(&self) -> f64 {
        self.current_vol
    }

    #[inline]
    pub fn variance(&self) -> f64 {
        self.ewma_variance
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[inline]
    pub fn updates(&self) -> u64 {
        self.updates
    }

    #[inline]
    pub fn reset(&mut self, initial_vol: f64) {
        self.current_vol = initial_vol;
        self.ewma_variance = 0.0;
        self.last_price = 0.0;
        self.initialized = false;
        self.updates = 0;
    }
}

impl Default for EwmaVolatility {
    fn default() -> Self {
        Self::new(0.15, 0.05, 0.02)
    }
}
