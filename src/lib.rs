#![allow(clippy::collapsible_if)]
#![allow(clippy::too_many_arguments)]

// Core modules
pub mod analysis;
pub mod chart;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod input;
pub mod ui;
pub mod utils;

// Re-export commonly used types outside of crate
pub use analysis::{DisplayZone, PatternAnalyzer, PatternZone, TimeframeAnalysis, ZoneKind};
pub use chart::Viewport;
pub use data::{BinanceProvider, KlineStream, MarketDataProvider, SeriesStore};
pub use domain::{Candle, Interval};
pub use engine::{ChartEngine, DataEvent, MarketKey, RenderFrame};
pub use ui::App;

// CLI argument parsing
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Trading pair to open, e.g. BTCUSDT (defaults to the last one viewed)
    #[arg(long)]
    pub symbol: Option<String>,

    /// Chart interval: 1m, 5m, 15m, 30m, 1h, 4h or 1d
    #[arg(long)]
    pub interval: Option<Interval>,

    /// Candles fetched for the chart
    #[arg(long, default_value_t = config::BINANCE.rest.chart_limit)]
    pub limit: i32,

    /// Show REST snapshots only, without the live kline stream
    #[arg(long, default_value_t = false)]
    pub no_stream: bool,
}

/// Main application entry point - creates the GUI app
/// This is the public API for the binary to call
pub fn run_app(cc: &eframe::CreationContext<'_>, args: Cli) -> App {
    App::new(cc, args)
}
