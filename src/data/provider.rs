use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::{
    config::{BINANCE, BinanceApiConfig},
    data::bn_kline::load_klines,
    domain::{Candle, Interval, MarketStats, RawMarketStats},
};

/// Abstract interface for fetching market data.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Latest `limit` candles for a symbol, oldest first.
    async fn fetch_candles(&self, symbol: &str, interval: Interval, limit: i32)
    -> Result<Vec<Candle>>;

    /// Rolling 24h statistics for a symbol.
    async fn fetch_24h_stats(&self, symbol: &str) -> Result<MarketStats>;
}

pub struct BinanceProvider {
    http: reqwest::Client,
}

impl BinanceProvider {
    pub fn new() -> Self {
        let config = BinanceApiConfig::default();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_default();
        Self { http }
    }
}

impl Default for BinanceProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for BinanceProvider {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: i32,
    ) -> Result<Vec<Candle>> {
        load_klines(symbol, interval, limit).await
    }

    async fn fetch_24h_stats(&self, symbol: &str) -> Result<MarketStats> {
        let url = format!("{}/ticker/24hr", BINANCE.rest.base_url);
        let raw: RawMarketStats = self
            .http
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await
            .with_context(|| format!("24h stats request failed for {}", symbol))?
            .error_for_status()
            .with_context(|| format!("24h stats rejected for {}", symbol))?
            .json()
            .await
            .with_context(|| format!("24h stats body unreadable for {}", symbol))?;

        MarketStats::try_from(raw)
    }
}
