// Domain types and value objects
mod candle;
mod interval;
mod stats;

// Re-export commonly used types to the world
pub use candle::{Candle, CandleDirection};
pub use interval::Interval;
pub use stats::{ChartStats, MarketStats, RawMarketStats};

/// Symbols offered by the viewer's symbol bar.
pub const CHART_SYMBOLS: &[&str] = &["BTCUSDT", "ETHUSDT", "BNBUSDT", "SOLUSDT"];
pub const DEFAULT_SYMBOL: &str = "BTCUSDT";
pub const DEFAULT_INTERVAL: Interval = Interval::H1;
