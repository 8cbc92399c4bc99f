pub mod engine;
pub mod simulator;

pub use engine::{Engine, EngineConfig, EngineState, EngineStats, ServiceSignal, StopReason};
pub use simulator::{FillConfig, FillOutcome, FillSimulator};
