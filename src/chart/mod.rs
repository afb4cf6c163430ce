// Chart space: domain <-> pixel mapping, viewport navigation and axis labels
pub mod axis;
pub mod coords;
mod viewport;

pub use coords::{
    CandleGeometry, ChartDomain, ChartRange, IndexDomain, PriceDomain, candle_to_pixels,
    index_to_pixel, pixel_to_index, pixel_to_price, price_to_pixel,
};
pub use viewport::{Viewport, visible_indices};
pub use axis::{PriceLabels, TimeLabel, format_price, price_labels, time_labels};
