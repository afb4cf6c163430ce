//! Viewport blueprint: visible window sizes, buffers and clamps.

pub struct ChartConfig {
    /// Candles shown after a fresh load (fewer if the series is shorter).
    pub default_visible_count: usize,
    /// Blank index space to the right of the newest candle after a fresh load.
    pub initial_future_buffer: f64,
    /// How far past the newest candle zoom/pan may reach.
    pub max_future_buffer: f64,
    /// Narrowest index window allowed (in candles).
    pub min_zoom_range: f64,
    /// Fraction of the visible price span added above and below on auto-fit.
    pub price_padding_pct: f64,
    /// Narrowest price window allowed.
    pub min_price_range: f64,
    /// Used when every visible price is identical (padding would be zero).
    pub flat_price_pad_pct: f64,
    pub default_width: u32,
    pub default_height: u32,
    /// Visual floor for doji bodies, applied by the renderer.
    pub min_body_height_px: f64,
    pub max_price_labels: usize,
}

pub const CHART: ChartConfig = ChartConfig {
    default_visible_count: 50,
    initial_future_buffer: 5.0,
    max_future_buffer: 30.0,
    min_zoom_range: 10.0,
    price_padding_pct: 0.10,
    min_price_range: 1e-8,
    flat_price_pad_pct: 0.01,
    default_width: 1120,
    default_height: 600,
    min_body_height_px: 1.0,
    max_price_labels: 8,
};
