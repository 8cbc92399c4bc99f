use crate::simulator::{FillOutcome, FillSimulator};
use latency_profiler::{LatencyProfiler, ScopedTimer};
use market_data::{EwmaVolatility, FrameParser, MarketTick, Quote};
use quote_engine::AvellanedaStoikov;
use risk_manager::{GateDecision, PnlTracker, RiskGate, Symbol};
use serde::{Deserialize, Serialize};
use sink::{
    QuoteRow, SessionRecord, SessionStatus, SinkBatcher, SinkError, SinkStore, StatRow, TickRow,
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Connecting,
    Running,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    KillSwitch,
    DurationExpired,
    FeedClosed,
    Fault,
}

impl StopReason {
    #[inline]
    fn session_status(self) -> SessionStatus {
        match self {
            StopReason::KillSwitch => SessionStatus::Stopped,
            StopReason::DurationExpired | StopReason::FeedClosed => SessionStatus::Completed,
            StopReason::Fault => SessionStatus::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceSignal {
    Continue,
    Stop(StopReason),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub symbol: String,
    pub duration_seconds: u64,
    /// Generate quotes every N ticks. Volatility, marks, and tick rows are
    /// still updated on every tick.
    pub quote_interval: u64,
    pub batch_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            duration_seconds: 120,
            quote_interval: 1,
            batch_size: sink::DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngineStats {
    pub ticks: u64,
    pub parse_failures: u64,
    pub quote_count: u64,
    pub fill_count: u64,
    pub buy_fills: u64,
    pub sell_fills: u64,
}

impl EngineStats {
    #[inline]
    pub fn fill_rate(&self) -> f64 {
        if self.quote_count == 0 {
            0.0
        } else {
            100.0 * self.fill_count as f64 / self.quote_count as f64
        }
    }
}

/// The per-tick pipeline. Each inbound frame is processed to completion,
/// strictly in order: parse, volatility update, kill-switch check, quote,
/// inventory widening, fill simulation, P&L, mark-to-mid, sink rows,
/// latency records. No error unwinds past a single tick.
pub struct Engine {
    config: EngineConfig,
    parser: FrameParser,
    volatility: EwmaVolatility,
    generator: AvellanedaStoikov,
    gate: RiskGate,
    simulator: FillSimulator,
    tracker: PnlTracker,
    batcher: SinkBatcher,
    store: Arc<dyn SinkStore>,
    profiler: Arc<LatencyProfiler>,
    session: SessionRecord,
    state: EngineState,
    stop_reason: Option<StopReason>,
    stats: EngineStats,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        generator: AvellanedaStoikov,
        volatility: EwmaVolatility,
        gate: RiskGate,
        simulator: FillSimulator,
        store: Arc<dyn SinkStore>,
        profiler: Arc<LatencyProfiler>,
    ) -> Self {
        let params = format!(
            "gamma={},sigma={},T={},kappa={}",
            generator.risk_aversion(),
            generator.volatility(),
            generator.time_horizon(),
            generator.inventory_penalty(),
        );
        let session = SessionRecord::new(config.symbol.clone(), config.duration_seconds, params);
        let batcher = SinkBatcher::new(store.clone(), config.batch_size);

        Self {
            config,
            parser: FrameParser::new(),
            volatility,
            generator,
            gate,
            simulator,
            tracker: PnlTracker::new(),
            batcher,
            store,
            profiler,
            session,
            state: EngineState::Connecting,
            stop_reason: None,
            stats: EngineStats::default(),
        }
    }

    /// Registers the session with the store and begins accepting frames.
    /// A failure here is fatal: the store was unreachable at startup.
    pub fn start(&mut self) -> Result<(), SinkError> {
        self.store.create_session(&self.session)?;
        self.state = EngineState::Running;
        info!(
            session_id = %self.session.session_id,
            symbol = %self.config.symbol,
            duration = self.config.duration_seconds,
            "engine running"
        );
        Ok(())
    }

    pub fn on_frame(&mut self, frame: &str) -> ServiceSignal {
        if self.state != EngineState::Running {
            return ServiceSignal::Stop(self.stop_reason.unwrap_or(StopReason::FeedClosed));
        }

        let profiler = self.profiler.clone();
        let _total = ScopedTimer::new(&profiler, "tick_total");
        self.stats.ticks += 1;

        let mut tick = {
            let _timer = ScopedTimer::new(&self.profiler, "frame_parse");
            match self.parser.parse(frame) {
                Ok(tick) => tick,
                Err(_) => {
                    self.stats.parse_failures += 1;
                    return ServiceSignal::Continue;
                }
            }
        };

        let mid_price = tick.mid_price();
        {
            let _timer = ScopedTimer::new(&self.profiler, "volatility_update");
            self.volatility.update(mid_price);
        }
        tick.volatility = self.volatility.volatility();
        self.generator.set_volatility(tick.volatility);

        {
            let _timer = ScopedTimer::new(&self.profiler, "sink_append");
            self.batcher.append_tick(self.tick_row(&tick));
        }

        if self.stats.ticks % self.config.quote_interval.max(1) == 0 {
            if let ServiceSignal::Stop(reason) = self.quoting_step(&tick) {
                return ServiceSignal::Stop(reason);
            }
        }

        // Re-mark against the latest mid on every tick, fills or not.
        {
            let _timer = ScopedTimer::new(&self.profiler, "pnl_update");
            self.tracker.update_market_price(&tick.symbol, mid_price);
        }

        ServiceSignal::Continue
    }

    fn quoting_step(&mut self, tick: &MarketTick) -> ServiceSignal {
        // Kill switch fires strictly before a new fill can be generated.
        if self.gate.check(self.tracker.total_pnl()) == GateDecision::KillSwitch {
            self.state = EngineState::Stopping;
            self.stop_reason = Some(StopReason::KillSwitch);
            return ServiceSignal::Stop(StopReason::KillSwitch);
        }

        let inventory = self
            .tracker
            .position_by_name(&tick.symbol)
            .map(|p| p.quantity)
            .unwrap_or(0.0);

        let mut quote = {
            let _timer = ScopedTimer::new(&self.profiler, "quote_generation");
            self.generator.quotes(tick, inventory)
        };
        self.gate.widen_for_inventory(&mut quote, inventory);

        if !quote.is_valid() {
            return ServiceSignal::Continue;
        }
        self.stats.quote_count += 1;

        let outcome = {
            let _timer = ScopedTimer::new(&self.profiler, "fill_simulation");
            self.simulator.simulate(&quote, tick)
        };
        self.apply_fills(&outcome);

        {
            let _timer = ScopedTimer::new(&self.profiler, "sink_append");
            self.batcher.append_quote(self.quote_row(tick, &quote));
            self.batcher.append_stat(self.stat_row(tick));
        }

        ServiceSignal::Continue
    }

    fn apply_fills(&mut self, outcome: &FillOutcome) {
        let _timer = ScopedTimer::new(&self.profiler, "pnl_update");
        if let Some(fill) = &outcome.bid_fill {
            self.tracker.update_fill(fill);
            self.stats.fill_count += 1;
            self.stats.buy_fills += 1;
            info!(price = fill.price, size = fill.size, "passive bid fill");
        }
        if let Some(fill) = &outcome.ask_fill {
            self.tracker.update_fill(fill);
            self.stats.fill_count += 1;
            self.stats.sell_fills += 1;
            info!(price = fill.price, size = fill.size, "passive ask fill");
        }
    }

    /// Drains the sink and writes the terminal session record. Idempotent:
    /// only the first call takes effect.
    pub fn stop(&mut self, reason: StopReason) {
        if self.state == EngineState::Stopped {
            return;
        }
        self.state = EngineState::Stopping;
        self.stop_reason = Some(reason);

        self.batcher.flush_all();

        self.session
            .finish(reason.session_status(), self.final_stats());
        if let Err(error) = self.store.update_session(&self.session) {
            warn!(%error, "failed to write terminal session record");
        }

        self.state = EngineState::Stopped;
        info!(
            session_id = %self.session.session_id,
            status = %self.session.status,
            ticks = self.stats.ticks,
            quotes = self.stats.quote_count,
            fills = self.stats.fill_count,
            total_pnl = self.tracker.total_pnl(),
            "engine stopped"
        );
    }

    fn final_stats(&self) -> String {
        let position = self
            .tracker
            .position_by_name(&self.config.symbol)
            .map(|p| p.quantity)
            .unwrap_or(0.0);
        format!(
            "total_pnl={:.8},realized_pnl={:.8},unrealized_pnl={:.8},fill_count={},quote_count={},final_position={:.8}",
            self.tracker.total_pnl(),
            self.tracker.realized_pnl(),
            self.tracker.unrealized_pnl(),
            self.stats.fill_count,
            self.stats.quote_count,
            position,
        )
    }

    fn tick_row(&self, tick: &MarketTick) -> TickRow {
        TickRow {
            time: tick.timestamp,
            symbol: tick.symbol.clone(),
            bid: tick.bid_price,
            bid_size: tick.bid_size,
            ask: tick.ask_price,
            ask_size: tick.ask_size,
            spread: tick.spread(),
            mid_price: tick.mid_price(),
            session_id: self.session.session_id.clone(),
        }
    }

    fn quote_row(&self, tick: &MarketTick, quote: &Quote) -> QuoteRow {
        let (position, avg_entry) = self.position_snapshot(&tick.symbol);
        QuoteRow {
            time: quote.timestamp,
            symbol: quote.symbol.clone(),
            our_bid: quote.bid_price,
            our_ask: quote.ask_price,
            our_spread: quote.spread(),
            spread_bps: quote.spread_bps(),
            market_mid: tick.mid_price(),
            position,
            avg_entry_price: avg_entry,
            volatility: self.volatility.volatility(),
            session_id: self.session.session_id.clone(),
        }
    }

    fn stat_row(&self, tick: &MarketTick) -> StatRow {
        let (position, avg_entry) = self.position_snapshot(&tick.symbol);
        StatRow {
            time: tick.timestamp,
            symbol: tick.symbol.clone(),
            position,
            avg_entry_price: avg_entry,
            realized_pnl: self.tracker.realized_pnl(),
            unrealized_pnl: self.tracker.unrealized_pnl(),
            total_pnl: self.tracker.total_pnl(),
            fill_count: self.stats.fill_count,
            quote_count: self.stats.quote_count,
            fill_rate: self.stats.fill_rate(),
            session_id: self.session.session_id.clone(),
        }
    }

    fn position_snapshot(&self, symbol: &str) -> (f64, f64) {
        match self.tracker.position_by_name(symbol) {
            Some(p) if !p.is_flat() => (p.quantity, p.average_price),
            Some(p) => (p.quantity, 0.0),
            None => (0.0, 0.0),
        }
    }

    #[inline]
    pub fn state(&self) -> EngineState {
        self.state
    }

    #[inline]
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    #[inline]
    pub fn session_id(&self) -> &str {
        &self.session.session_id
    }

    #[inline]
    pub fn tracker(&self) -> &PnlTracker {
        &self.tracker
    }

    /// Direct access to the position table, for execution reports arriving
    /// outside the simulated fill path.
    #[inline]
    pub fn tracker_mut(&mut self) -> &mut PnlTracker {
        &mut self.tracker
    }

    #[inline]
    pub fn parser(&self) -> &FrameParser {
        &self.parser
    }

    #[inline]
    pub fn live_volatility(&self) -> f64 {
        self.volatility.volatility()
    }

    #[inline]
    pub fn inventory(&self) -> f64 {
        Symbol::parse(&self.config.symbol)
            .map(|s| self.tracker.position(s).quantity)
            .unwrap_or(0.0)
    }

    pub fn summary(&self) -> String {
        format!(
            "ticks={} parse_failures={} quotes={} fills={} ({} buy / {} sell, {:.1}% fill rate)\n{}",
            self.stats.ticks,
            self.stats.parse_failures,
            self.stats.quote_count,
            self.stats.fill_count,
            self.stats.buy_fills,
            self.stats.sell_fills,
            self.stats.fill_rate(),
            self.tracker.summary(),
        )
    }
}
