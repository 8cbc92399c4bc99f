pub mod generator;

pub use generator::{AvellanedaStoikov, QuoteConfig, QuoteError};
