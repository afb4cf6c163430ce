use {
    anyhow::{Result, bail},
    binance_sdk::{
        config::ConfigurationRestApi,
        errors::{self, ConnectorError as connection_error},
        spot::{
            SpotRestApi,
            rest_api::{KlinesIntervalEnum, KlinesItemInner, KlinesParams, RestApi},
        },
    },
    std::{convert::TryFrom, error::Error, fmt},
};

use crate::{
    config::BinanceApiConfig,
    domain::{Candle, Interval},
};

#[cfg(debug_assertions)]
use crate::config::DF;

pub fn klines_interval(interval: Interval) -> KlinesIntervalEnum {
    match interval {
        Interval::M1 => KlinesIntervalEnum::Interval1m,
        Interval::M5 => KlinesIntervalEnum::Interval5m,
        Interval::M15 => KlinesIntervalEnum::Interval15m,
        Interval::M30 => KlinesIntervalEnum::Interval30m,
        Interval::H1 => KlinesIntervalEnum::Interval1h,
        Interval::H4 => KlinesIntervalEnum::Interval4h,
        Interval::D1 => KlinesIntervalEnum::Interval1d,
    }
}

/// One REST kline row. Prices are `None` when the field was absent or unparsable.
#[derive(Debug, PartialOrd, PartialEq)]
pub struct BNKline {
    pub open_timestamp_ms: i64,
    pub open_price: Option<f64>,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub close_price: Option<f64>,
    pub base_asset_volume: Option<f64>,
}

#[derive(Debug)]
pub enum BNKlineError {
    InvalidLength,
    InvalidType(String),
    MissingField(&'static str),
    ConnectionFailed(String),
}

impl fmt::Display for BNKlineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::fmt::Result {
        match self {
            BNKlineError::InvalidLength => write!(f, "Invalid length"),
            BNKlineError::InvalidType(string) => write!(f, "Invalid type: {}", string),
            BNKlineError::MissingField(field) => write!(f, "Missing kline field: {}", field),
            BNKlineError::ConnectionFailed(msg) => {
                write!(f, "Binance API connection failed: {}.", msg)
            }
        }
    }
}

impl Error for BNKlineError {}

fn convert_kline_item_inner_enum_string_to_float(kline: Option<KlinesItemInner>) -> Option<f64> {
    kline.and_then(|inner| {
        if let KlinesItemInner::String(s) = inner {
            s.parse::<f64>().ok()
        } else {
            None
        }
    })
}

impl TryFrom<Vec<KlinesItemInner>> for BNKline {
    type Error = BNKlineError;

    fn try_from(vec_inner_klines: Vec<KlinesItemInner>) -> Result<Self, Self::Error> {
        let mut items = vec_inner_klines.into_iter();
        let open_timestamp_ms = match items.next().ok_or(BNKlineError::InvalidLength)? {
            KlinesItemInner::Integer(a) => a,
            _ => return Err(BNKlineError::InvalidType("open_time".to_string())),
        };

        Ok(BNKline {
            open_timestamp_ms,
            open_price: convert_kline_item_inner_enum_string_to_float(items.next()),
            high_price: convert_kline_item_inner_enum_string_to_float(items.next()),
            low_price: convert_kline_item_inner_enum_string_to_float(items.next()),
            close_price: convert_kline_item_inner_enum_string_to_float(items.next()),
            base_asset_volume: convert_kline_item_inner_enum_string_to_float(items.next()),
        })
    }
}

impl TryFrom<BNKline> for Candle {
    type Error = BNKlineError;

    fn try_from(bn: BNKline) -> Result<Self, Self::Error> {
        use BNKlineError::MissingField;
        Ok(Candle::new(
            bn.open_timestamp_ms,
            bn.open_price.ok_or(MissingField("open"))?,
            bn.high_price.ok_or(MissingField("high"))?,
            bn.low_price.ok_or(MissingField("low"))?,
            bn.close_price.ok_or(MissingField("close"))?,
            bn.base_asset_volume.ok_or(MissingField("volume"))?,
        ))
    }
}

/// Rows that fail to convert are skipped with a warning; the rest are kept in order.
fn convert_klines(data: Vec<Vec<KlinesItemInner>>, label: &str) -> Vec<Candle> {
    #[cfg(debug_assertions)]
    let total = data.len();
    let candles: Vec<Candle> = data
        .into_iter()
        .filter_map(|row| {
            BNKline::try_from(row)
                .and_then(Candle::try_from)
                .map_err(|e| log::warn!("{}: dropping kline row: {}", label, e))
                .ok()
        })
        .collect();

    #[cfg(debug_assertions)]
    if DF.log_snapshots && candles.len() != total {
        log::info!("{}: kept {} of {} kline rows", label, candles.len(), total);
    }
    candles
}

async fn configure_binance_client() -> Result<RestApi, anyhow::Error> {
    let config = BinanceApiConfig::default();
    let rest_conf = ConfigurationRestApi::builder()
        .timeout(config.timeout_ms)
        .retries(config.retries)
        .backoff(config.backoff_ms)
        .build()?;
    // Create the Spot REST API client
    let rest_client = SpotRestApi::production(rest_conf);
    Ok(rest_client)
}

async fn fetch_binance_klines(
    rest_client: &RestApi,
    params: KlinesParams,
    label: &str,
) -> Result<Vec<Vec<KlinesItemInner>>, anyhow::Error> {
    match rest_client.klines(params).await {
        Ok(r) => Ok(r.data().await?),
        Err(e) => {
            if let Some(conn_err) = e.downcast_ref::<errors::ConnectorError>() {
                match conn_err {
                    connection_error::ConnectorClientError(msg) => {
                        log::error!("{} Client error: Check your request parameters. {}", label, msg);
                    }
                    connection_error::TooManyRequestsError(msg) => {
                        log::warn!("{} Rate limit exceeded. Please wait and try again. {}", label, msg);
                    }
                    connection_error::RateLimitBanError(msg) => {
                        log::error!("{} IP address banned due to excessive rate limits. {}", label, msg);
                    }
                    errors::ConnectorError::ServerError { msg, status_code } => {
                        log::error!("{} Server error: {} (status code: {:?})", label, msg, status_code);
                    }
                    errors::ConnectorError::NetworkError(msg) => {
                        log::error!("{} Network error: Check your internet connection. {}", label, msg);
                    }
                    connection_error::BadRequestError(msg) => {
                        log::warn!("{} Bad request: Verify your input parameters. {}", label, msg);
                    }
                    other => {
                        log::error!("{} Unexpected ConnectionError variant: {:?}", label, other);
                    }
                }
                Err(
                    anyhow::Error::new(BNKlineError::ConnectionFailed(conn_err.to_string()))
                        .context(format!("Binance API call failed for {}", label)),
                )
            } else {
                log::error!("An unexpected error occurred for {}: {:#}", label, e);
                Err(
                    anyhow::Error::new(BNKlineError::ConnectionFailed(e.to_string()))
                        .context(format!("Unexpected error during API call for {}", label)),
                )
            }
        }
    }
}

/// Latest `limit` klines for `symbol`, oldest first.
pub async fn load_klines(symbol: &str, interval: Interval, limit: i32) -> Result<Vec<Candle>> {
    let label = format!("{}_{}", symbol, interval);
    let rest_client = configure_binance_client().await?;

    let params = KlinesParams::builder(symbol.to_string(), klines_interval(interval))
        .limit(limit)
        .build()?;

    let rows = fetch_binance_klines(&rest_client, params, &label).await?;
    let candles = convert_klines(rows, &label);
    if candles.is_empty() {
        bail!("{}: no usable klines returned", label);
    }
    Ok(candles)
}
