pub mod gate;
pub mod position;
pub mod symbol;
pub mod tracker;

pub use gate::{GateDecision, RiskConfig, RiskGate};
pub use position::Position;
pub use symbol::{Symbol, SYMBOL_COUNT};
pub use tracker::PnlTracker;
