pub mod feed;
pub mod parser;
pub mod types;
pub mod volatility;

pub use feed::{ChannelSource, FeedConfig, FrameSource, SimulatedFeed};
pub use parser::{FrameParser, ParseError};
pub use types::{Fill, MarketTick, OrderId, Quote, Side};
pub use volatility::{EwmaVolatility, SECONDS_PER_YEAR};
