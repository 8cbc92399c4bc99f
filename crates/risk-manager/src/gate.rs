use market_data::Quote;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Stop quoting once total P&L drops to or below this level.
    pub kill_switch_pnl: f64,
    /// Inventory size treated as 100% utilization for spread widening.
    pub max_inventory: f64,
    /// Widening factor applied as utilization moves from 50% to 100%.
    pub max_spread_multiplier: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            kill_switch_pnl: -10.0,
            max_inventory: 0.1,
            max_spread_multiplier: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    KillSwitch,
}

/// Pre-quote safety layer: a P&L kill switch checked before every quoting
/// step, and inventory-proportional spread widening applied to quotes that
/// pass. Widening preserves the quote midpoint so the inventory skew from
/// the generator is untouched.
#[derive(Debug, Clone)]
pub struct RiskGate {
    config: RiskConfig,
    tripped: bool,
}

impl RiskGate {
    #[inline]
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config,
            tripped: false,
        }
    }

    /// Checked strictly before a new quote (and therefore any new fill) is
    /// generated. Once tripped the gate stays tripped.
    #[inline]
    pub fn check(&mut self, total_pnl: f64) -> GateDecision {
        if self.tripped {
            return GateDecision::KillSwitch;
        }
        if total_pnl <= self.config.kill_switch_pnl {
            self.tripped = true;
            warn!(
                total_pnl,
                threshold = self.config.kill_switch_pnl,
                "kill switch tripped, halting quoting"
            );
            return GateDecision::KillSwitch;
        }
        GateDecision::Pass
    }

    #[inline]
    pub fn is_tripped(&self) -> bool {
        self.tripped
    }

    /// Widens the quote symmetrically when inventory utilization exceeds
    /// 50%: multiplier `1 + (ratio - 0.5) * max_spread_multiplier`.
    #[inline]
    pub fn widen_for_inventory(&self, quote: &mut Quote, inventory: f64) {
        let ratio = inventory.abs() / self.config.max_inventory;
        if ratio <= 0.5 {
            return;
        }

        let multiplier = 1.0 + (ratio - 0.5) * self.config.max_spread_multiplier;
        let spread = quote.spread();
        let adjustment = (spread * multiplier - spread) / 2.0;
        quote.bid_price -= adjustment;
        quote.ask_price += adjustment;
    }

    #[inline]
    pub fn config(&self) -> &RiskConfig {
        &self.config
    }
}

impl Default for RiskGate {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}
