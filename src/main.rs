use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::signal;
use tracing::{info, warn, Level};

use latency_profiler::LatencyProfiler;
use market_data::{EwmaVolatility, FrameSource, SimulatedFeed};
use mm_engine::config::Settings;
use mm_engine::utils::{current_timestamp_nanos, format_duration_ns};
use quote_engine::AvellanedaStoikov;
use risk_manager::RiskGate;
use sink::LoggingStore;
use trading_engine::{Engine, FillSimulator, ServiceSignal, StopReason};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const CONFIG_PATH: &str = "mm-engine.toml";
const DEFAULT_DURATION_SECONDS: u64 = 120;

fn duration_from_args() -> u64 {
    match std::env::args().nth(1) {
        Some(raw) => match raw.parse::<i64>() {
            Ok(seconds) if seconds > 0 => seconds as u64,
            _ => {
                warn!(
                    argument = %raw,
                    default = DEFAULT_DURATION_SECONDS,
                    "duration must be a positive integer, using default"
                );
                DEFAULT_DURATION_SECONDS
            }
        },
        None => DEFAULT_DURATION_SECONDS,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting mm-engine v{}", env!("CARGO_PKG_VERSION"));

    let mut settings = Settings::load_or_default(CONFIG_PATH)?;
    settings.engine.duration_seconds = duration_from_args();
    let seed = settings.seed.unwrap_or_else(current_timestamp_nanos);

    info!(
        symbol = %settings.engine.symbol,
        duration = settings.engine.duration_seconds,
        gamma = settings.quote.risk_aversion,
        kappa = settings.quote.inventory_penalty,
        time_horizon = settings.quote.time_horizon,
        seed,
        "session parameters"
    );

    let profiler = Arc::new(LatencyProfiler::new());
    let store = Arc::new(LoggingStore::new());

    let mut engine = Engine::new(
        settings.engine.clone(),
        AvellanedaStoikov::new(settings.quote.clone()),
        EwmaVolatility::new(
            settings.volatility.alpha,
            settings.volatility.initial,
            settings.volatility.floor,
        ),
        RiskGate::new(settings.risk.clone()),
        FillSimulator::new(settings.fill.clone(), seed),
        store,
        profiler.clone(),
    );
    engine.start()?;

    // The feed gets its own RNG stream so replaying the fill seed does not
    // also replay the market.
    let mut feed = SimulatedFeed::new(settings.feed.clone(), seed.rotate_left(17));
    let started_at = Instant::now();
    let tick_period = Duration::from_secs_f64(settings.feed.time_step_seconds);
    let deadline = tokio::time::Instant::now()
        + Duration::from_secs(settings.engine.duration_seconds);
    let mut ticker = tokio::time::interval(tick_period);

    let reason = loop {
        tokio::select! {
            _ = ticker.tick() => {
                if tokio::time::Instant::now() >= deadline {
                    info!("session duration reached");
                    break StopReason::DurationExpired;
                }
                match feed.next_frame() {
                    Some(frame) => {
                        if let ServiceSignal::Stop(reason) = engine.on_frame(&frame) {
                            break reason;
                        }
                    }
                    None => {
                        warn!("frame source closed");
                        break StopReason::FeedClosed;
                    }
                }
            }
            _ = signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                break StopReason::FeedClosed;
            }
        }
    };

    engine.stop(reason);

    info!(
        runtime = %format_duration_ns(started_at.elapsed().as_nanos() as u64),
        "session runtime"
    );
    info!("\n{}", engine.summary());
    info!("\n{}", profiler.report());

    Ok(())
}
