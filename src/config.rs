//! Configuration management

use anyhow::Result;
use market_data::FeedConfig;
use quote_engine::QuoteConfig;
use risk_manager::RiskConfig;
use serde::{Deserialize, Serialize};
use trading_engine::{EngineConfig, FillConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilitySettings {
    /// EWMA smoothing factor for squared log returns.
    pub alpha: f64,
    /// Volatility reported until the second valid price arrives.
    pub initial: f64,
    /// Lower bound on the reported annualized volatility.
    pub floor: f64,
}

impl Default for VolatilitySettings {
    fn default() -> Self {
        Self {
            alpha: 0.15,
            initial: 0.05,
            floor: 0.02,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// RNG seed for the fill simulator and simulated feed. Time-derived
    /// when absent; set it to replay a run exactly.
    pub seed: Option<u64>,
    pub engine: EngineConfig,
    pub quote: QuoteConfig,
    pub risk: RiskConfig,
    pub fill: FillConfig,
    pub feed: FeedConfig,
    pub volatility: VolatilitySettings,
}

impl Settings {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Loads the given file if it exists, otherwise returns defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if std::path::Path::new(path).exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_model_parameters() {
        let settings = Settings::default();
        assert_eq!(settings.quote.risk_aversion, 0.1);
        assert_eq!(settings.quote.inventory_penalty, 1.5);
        assert_eq!(settings.quote.time_horizon, 60.0);
        assert_eq!(settings.risk.kill_switch_pnl, -10.0);
        assert_eq!(settings.fill.fill_size, 0.01);
        assert_eq!(settings.engine.batch_size, 50);
        assert_eq!(settings.volatility.alpha, 0.15);
        assert!(settings.seed.is_none());
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let settings = Settings::default();
        let text = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed.engine.symbol, settings.engine.symbol);
        assert_eq!(parsed.quote.risk_aversion, settings.quote.risk_aversion);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let parsed: Settings = toml::from_str("[quote]\nrisk_aversion = 0.2\n").unwrap();
        assert_eq!(parsed.quote.risk_aversion, 0.2);
        // Untouched sections keep their defaults.
        assert_eq!(parsed.risk.kill_switch_pnl, -10.0);
        assert_eq!(parsed.engine.symbol, "BTCUSDT");
    }
}
