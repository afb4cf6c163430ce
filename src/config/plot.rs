//! Plot visualization configuration

use eframe::egui::Color32;

use crate::domain::Interval;

pub struct PlotConfig {
    pub background_color: Color32,
    pub grid_color: Color32,
    pub axis_text_color: Color32,

    // --- CANDLESTICKS ---
    pub candle_bullish_color: Color32,
    pub candle_bearish_color: Color32,
    pub candle_width_pct: f32,  // 0.0 to 1.0 (relative to slot width)
    pub candle_wick_width: f32, // Pixels

    // --- ZONES ---
    pub zone_15m_color: Color32,
    pub zone_30m_color: Color32,
    pub zone_1h_color: Color32,
    pub zone_4h_color: Color32,
    /// Fill opacity for zone rectangles (0.0 = invisible, 1.0 = fully opaque)
    pub zone_fill_opacity_pct: f32,
    pub zone_boundary_line_width: f32,

    // --- OVERLAYS ---
    pub crosshair_color: Color32,
    pub current_price_color: Color32,
    pub current_price_line_width: f32,
    /// Visible high/low marker line and label fill.
    pub extreme_marker_color: Color32,

    /// Space reserved right of the plot for price labels.
    pub price_axis_width: f32,
    /// Space reserved under the plot for time labels.
    pub time_axis_height: f32,

    pub color_profit: Color32,
    pub color_loss: Color32,
    pub color_text_primary: Color32,
    pub color_text_subdued: Color32,
}

impl PlotConfig {
    pub fn zone_color(&self, timeframe: Interval) -> Color32 {
        match timeframe {
            Interval::M15 => self.zone_15m_color,
            Interval::M30 => self.zone_30m_color,
            Interval::H1 => self.zone_1h_color,
            Interval::H4 => self.zone_4h_color,
            _ => self.color_text_subdued,
        }
    }
}

pub const PLOT_CONFIG: PlotConfig = PlotConfig {
    background_color: Color32::from_rgb(17, 24, 39),
    grid_color: Color32::from_gray(45),
    axis_text_color: Color32::from_gray(160),

    candle_bullish_color: Color32::from_rgb(38, 166, 154), // TradingView Green
    candle_bearish_color: Color32::from_rgb(239, 83, 80),  // TradingView Red
    candle_width_pct: 0.8, // 80% width leaves a small gap between candles
    candle_wick_width: 1.0,

    zone_15m_color: Color32::from_rgb(16, 185, 129), // Emerald
    zone_30m_color: Color32::from_rgb(59, 130, 246), // Blue
    zone_1h_color: Color32::from_rgb(139, 92, 246),  // Violet
    zone_4h_color: Color32::from_rgb(6, 182, 212),   // Cyan
    zone_fill_opacity_pct: 0.20,
    zone_boundary_line_width: 1.0,

    crosshair_color: Color32::from_gray(140),
    current_price_color: Color32::from_rgb(255, 215, 0), // Gold
    current_price_line_width: 1.0,
    extreme_marker_color: Color32::from_gray(150),

    price_axis_width: 80.0,
    time_axis_height: 28.0,

    color_profit: Color32::from_rgb(100, 255, 100),
    color_loss: Color32::from_rgb(255, 80, 80),
    color_text_primary: Color32::WHITE,
    color_text_subdued: Color32::GRAY,
};
