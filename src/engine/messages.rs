use std::fmt;

use crate::domain::{Candle, Interval, MarketStats};

/// Which series a snapshot feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesTarget {
    /// The displayed chart series.
    Chart,
    /// History for one pattern timeframe.
    Pattern,
}

/// Symbol + interval pair that every data event is tagged with, so results for a
/// market the user already left can be discarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarketKey {
    pub symbol: String,
    pub interval: Interval,
}

impl MarketKey {
    pub fn new(symbol: impl Into<String>, interval: Interval) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
        }
    }
}

impl fmt::Display for MarketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.symbol, self.interval)
    }
}

/// Lifecycle notifications from the kline stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    Connected,
    Disconnected,
    Error(String),
    /// Reconnect attempts exhausted; the stream has stopped for good.
    GaveUp,
}

/// Everything the background data tasks report back to the engine.
#[derive(Debug, Clone)]
pub enum DataEvent {
    Snapshot {
        key: MarketKey,
        target: SeriesTarget,
        candles: Vec<Candle>,
    },
    SnapshotFailed {
        key: MarketKey,
        target: SeriesTarget,
        error: String,
    },
    Stats {
        symbol: String,
        stats: MarketStats,
    },
    StatsFailed {
        symbol: String,
        error: String,
    },
    Tick {
        key: MarketKey,
        candle: Candle,
    },
    Connection {
        key: MarketKey,
        event: ConnectionEvent,
    },
}

/// A REST snapshot the host should run in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRequest {
    pub key: MarketKey,
    pub target: SeriesTarget,
    pub limit: i32,
}
