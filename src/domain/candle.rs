use serde::{Deserialize, Serialize};

/// Direction of a single candle body. A doji (open == close) is `Neutral`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandleDirection {
    Bullish,
    Bearish,
    Neutral,
}

/// One OHLCV bar. `timestamp_ms` is the bucket's open time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp_ms: i64,

    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub close_price: f64,

    pub volume: f64,
}

impl Candle {
    // A constructor for convenience
    pub fn new(timestamp_ms: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Candle {
            timestamp_ms,
            open_price: open,
            high_price: high,
            low_price: low,
            close_price: close,
            volume,
        }
    }

    pub fn direction(&self) -> CandleDirection {
        if self.close_price > self.open_price {
            CandleDirection::Bullish
        } else if self.close_price < self.open_price {
            CandleDirection::Bearish
        } else {
            CandleDirection::Neutral
        }
    }

    /// Upper edge of the body: max(open, close).
    pub fn body_top(&self) -> f64 {
        self.open_price.max(self.close_price)
    }

    /// Lower edge of the body: min(open, close).
    pub fn body_bottom(&self) -> f64 {
        self.open_price.min(self.close_price)
    }

    /// Finite prices, a positive timestamp and `low <= body <= high`.
    pub fn is_valid(&self) -> bool {
        let fields = [
            self.open_price,
            self.high_price,
            self.low_price,
            self.close_price,
            self.volume,
        ];
        self.timestamp_ms > 0
            && fields.iter().all(|v| v.is_finite())
            && self.low_price <= self.body_bottom()
            && self.body_top() <= self.high_price
    }

    /// All four prices, for min/max scans.
    pub fn prices(&self) -> [f64; 4] {
        [
            self.open_price,
            self.high_price,
            self.low_price,
            self.close_price,
        ]
    }
}
