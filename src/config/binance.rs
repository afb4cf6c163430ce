use std::time::Duration;

pub struct BinanceApiConfig {
    pub timeout_ms: u64,
    pub retries: u32,
    pub backoff_ms: u64,
}

impl Default for BinanceApiConfig {
    fn default() -> Self {
        Self {
            timeout_ms: BINANCE.client.timeout_ms,
            retries: BINANCE.client.retries,
            backoff_ms: BINANCE.client.backoff_ms,
        }
    }
}

/// REST endpoints and kline limits.
pub struct RestConfig {
    pub base_url: &'static str,
    /// Klines requested for the main chart.
    pub chart_limit: i32,
    /// Klines requested per pattern timeframe (more history, more zones).
    pub pattern_limit: i32,
    /// Cap on the live series; the oldest candle is dropped past this.
    pub retention_limit: usize,
}

/// Exponential backoff for the kline stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (1-based): base doubled per attempt, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

pub struct WsConfig {
    pub base_url: &'static str,
    pub reconnect: ReconnectPolicy,
}

pub struct ClientDefaults {
    pub timeout_ms: u64,
    pub retries: u32,
    pub backoff_ms: u64,
}

pub struct BinanceConfig {
    pub rest: RestConfig,
    pub ws: WsConfig,
    pub client: ClientDefaults,
}

pub const BINANCE: BinanceConfig = BinanceConfig {
    rest: RestConfig {
        base_url: "https://api.binance.com/api/v3",
        chart_limit: 100,
        pattern_limit: 1000,
        retention_limit: 2400,
    },
    ws: WsConfig {
        base_url: "wss://stream.binance.com:9443/ws",
        reconnect: ReconnectPolicy {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: 999,
        },
    },
    client: ClientDefaults {
        timeout_ms: 5000,
        retries: 5,
        backoff_ms: 5000,
    },
};
