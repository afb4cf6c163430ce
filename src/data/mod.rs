mod bn_kline;
mod fetch;
mod provider;
mod series;
mod stream;

pub use {
    fetch::spawn_snapshot_fetch,
    provider::{BinanceProvider, MarketDataProvider},
    series::{Reconciled, SeriesStore},
    stream::{
        KlineParseError, KlineStream, StreamError, StreamStatus, parse_kline_message,
        try_parse_kline_message,
    },
};
