use {
    anyhow::{Context, Result},
    serde::{Deserialize, Serialize},
};

/// 24h ticker payload as delivered by the exchange: every number is a decimal string.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMarketStats {
    pub price_change: String,
    pub price_change_percent: String,
    pub high_price: String,
    pub low_price: String,
    pub volume: String,
}

/// Parsed 24h rolling statistics for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketStats {
    pub price_change: f64,
    pub price_change_pct: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
}

fn parse_decimal(field: &str, value: &str) -> Result<f64> {
    let parsed: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("24h stats field `{}` is not a number: {:?}", field, value))?;
    if !parsed.is_finite() {
        anyhow::bail!("24h stats field `{}` is not finite: {:?}", field, value);
    }
    Ok(parsed)
}

impl TryFrom<RawMarketStats> for MarketStats {
    type Error = anyhow::Error;

    fn try_from(raw: RawMarketStats) -> Result<Self> {
        Ok(MarketStats {
            price_change: parse_decimal("priceChange", &raw.price_change)?,
            price_change_pct: parse_decimal("priceChangePercent", &raw.price_change_percent)?,
            high: parse_decimal("highPrice", &raw.high_price)?,
            low: parse_decimal("lowPrice", &raw.low_price)?,
            volume: parse_decimal("volume", &raw.volume)?,
        })
    }
}

/// Header figures: 24h stats combined with the live price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartStats {
    pub current_price: f64,
    pub price_change: f64,
    pub price_change_pct: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
    pub is_positive: bool,
}

impl ChartStats {
    pub fn new(market: &MarketStats, current_price: f64) -> Self {
        Self {
            current_price,
            price_change: market.price_change,
            price_change_pct: market.price_change_pct,
            high: market.high,
            low: market.low,
            volume: market.volume,
            is_positive: market.price_change >= 0.0,
        }
    }
}
