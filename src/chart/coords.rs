//! Pure conversions between data space `{index, price}` and pixel space `{x, y}`.
//!
//! Pixel `y` grows downward while price grows upward, so the price axis is inverted.

use {
    crate::domain::Candle,
    serde::{Deserialize, Serialize},
};

/// Visible window over the candle array, in (possibly fractional) indices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexDomain {
    pub start: f64,
    pub end: f64,
}

impl IndexDomain {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }

    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

/// Visible price window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceDomain {
    pub min: f64,
    pub max: f64,
}

impl PriceDomain {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    pub fn center(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartDomain {
    pub index: IndexDomain,
    pub price: PriceDomain,
}

/// Plot area size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartRange {
    pub width: f64,
    pub height: f64,
}

impl ChartRange {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Render geometry for one candle. `body_y` is the top edge of the body in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandleGeometry {
    pub x: f64,
    pub candle_width: f64,
    pub high_y: f64,
    pub low_y: f64,
    pub body_y: f64,
    pub body_height: f64,
    pub wick_height: f64,
}

pub fn index_to_pixel(index: f64, domain: &IndexDomain, range: &ChartRange) -> f64 {
    let normalized = (index - domain.start) / domain.width();
    normalized * range.width
}

pub fn pixel_to_index(x: f64, domain: &IndexDomain, range: &ChartRange) -> f64 {
    domain.start + (x / range.width) * domain.width()
}

pub fn price_to_pixel(price: f64, domain: &PriceDomain, range: &ChartRange) -> f64 {
    let normalized = (price - domain.min) / domain.range();
    range.height - normalized * range.height
}

pub fn pixel_to_price(y: f64, domain: &PriceDomain, range: &ChartRange) -> f64 {
    let normalized = (range.height - y) / range.height;
    domain.min + normalized * domain.range()
}

/// Body height is the exact pixel distance between open and close; any minimum
/// height for doji candles is applied by the caller.
pub fn candle_to_pixels(
    candle: &Candle,
    index: usize,
    domain: &ChartDomain,
    range: &ChartRange,
) -> CandleGeometry {
    let x = index_to_pixel(index as f64, &domain.index, range);
    let candle_width = range.width / domain.index.width();

    let high_y = price_to_pixel(candle.high_price, &domain.price, range);
    let low_y = price_to_pixel(candle.low_price, &domain.price, range);
    let open_y = price_to_pixel(candle.open_price, &domain.price, range);
    let close_y = price_to_pixel(candle.close_price, &domain.price, range);

    CandleGeometry {
        x,
        candle_width,
        high_y,
        low_y,
        body_y: open_y.min(close_y),
        body_height: (close_y - open_y).abs(),
        wick_height: low_y - high_y,
    }
}
