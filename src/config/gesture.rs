//! Input tuning: timers, thresholds and zoom steps for mouse and touch.

use std::time::Duration;

pub struct GestureConfig {
    /// Finger held still this long turns into a crosshair.
    pub long_press: Duration,
    /// Movement (px) that turns a pending touch into a pan.
    pub pan_threshold_px: f64,
    /// Crosshair stays visible this long after lift-off.
    pub crosshair_linger: Duration,
    pub pinch_min_factor: f64,
    pub pinch_max_factor: f64,
    pub wheel_zoom_out: f64,
    pub wheel_zoom_in: f64,
    /// Wheel zooms closer together than this are dropped.
    pub wheel_min_interval: Duration,
    /// Per-axis drag movement (px) ignored as jitter.
    pub drag_dead_zone_px: f64,
    /// Zoom factor per pixel when dragging an axis.
    pub axis_zoom_sensitivity: f64,
    pub hover_delay: Duration,
    pub touch_tooltip_linger: Duration,
    pub tooltip_width: f64,
    pub tooltip_height: f64,
    pub tooltip_offset: f64,
}

pub const GESTURES: GestureConfig = GestureConfig {
    long_press: Duration::from_millis(500),
    pan_threshold_px: 5.0,
    crosshair_linger: Duration::from_millis(1500),
    pinch_min_factor: 0.8,
    pinch_max_factor: 1.2,
    wheel_zoom_out: 1.1,
    wheel_zoom_in: 0.9,
    wheel_min_interval: Duration::from_millis(16),
    drag_dead_zone_px: 1.0,
    axis_zoom_sensitivity: 0.01,
    hover_delay: Duration::from_millis(500),
    touch_tooltip_linger: Duration::from_millis(2000),
    tooltip_width: 160.0,
    tooltip_height: 180.0,
    tooltip_offset: 10.0,
};
