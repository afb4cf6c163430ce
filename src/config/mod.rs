//! Configuration module for the chart engine and viewer.

// Can all be private now because we have a public re-export.
mod binance;
mod chart;
mod debug;
mod gesture;
mod pattern;
mod plot;

// Re-export commonly used items
pub use binance::{BINANCE, BinanceApiConfig, BinanceConfig, ReconnectPolicy};
pub use chart::{CHART, ChartConfig};
pub use debug::{DF, LogFlags};
pub use gesture::{GESTURES, GestureConfig};
pub use pattern::{BreakAction, DEFAULT_ENABLED_TIMEFRAMES, PATTERNS, PatternSettings};
pub use plot::{PLOT_CONFIG, PlotConfig};
