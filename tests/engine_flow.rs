use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::{Arc, mpsc::channel};

use zone_scope::{
    Candle, ChartEngine, DataEvent, Interval, MarketDataProvider, MarketKey,
    data::{Reconciled, parse_kline_message, spawn_snapshot_fetch},
    domain::MarketStats,
    engine::{LoadState, SeriesTarget},
};

const HOUR: i64 = 3_600_000;
const QUARTER: i64 = 900_000;

/// Chart series: a slow uptrend. 15m series: six green candles, then a red one
/// closing back inside the first body, then filler.
struct ScriptedProvider;

#[async_trait]
impl MarketDataProvider for ScriptedProvider {
    async fn fetch_candles(&self, symbol: &str, interval: Interval, limit: i32) -> Result<Vec<Candle>> {
        if symbol == "DOWNUSDT" {
            bail!("exchange unavailable");
        }
        let n = limit.min(120) as i64;
        let candles = match interval {
            Interval::M15 => (0..n)
                .map(|i| {
                    let (open, close) = match i {
                        0..=5 => (100.0 + i as f64, 101.0 + i as f64),
                        6 => (106.0, 100.5),
                        _ => (100.5, 100.5),
                    };
                    let ts = HOUR + i * QUARTER;
                    Candle::new(ts, open, open.max(close) + 0.5, open.min(close) - 0.5, close, 3.0)
                })
                .collect(),
            _ => (0..n)
                .map(|i| {
                    let base = 100.0 + i as f64 * 0.1;
                    let ts = HOUR * (i + 1);
                    Candle::new(ts, base, base + 1.0, base - 1.0, base + 0.05, 10.0)
                })
                .collect(),
        };
        Ok(candles)
    }

    async fn fetch_24h_stats(&self, _symbol: &str) -> Result<MarketStats> {
        Ok(MarketStats {
            price_change: 5.0,
            price_change_pct: 2.5,
            high: 115.0,
            low: 99.0,
            volume: 1_000.0,
        })
    }
}

fn load(engine: &mut ChartEngine) {
    let (tx, rx) = channel();
    let requests = engine.start_loading();
    let symbol = engine.symbol().to_string();
    spawn_snapshot_fetch(Arc::new(ScriptedProvider), requests, Some(symbol), tx)
        .join()
        .unwrap();
    engine.process_events(&rx);
}

fn kline_json(symbol: &str, open_time: i64, open: f64, high: f64, low: f64, close: f64) -> String {
    format!(
        r#"{{"e":"kline","E":{e},"s":"{symbol}","k":{{"t":{open_time},"T":{t_end},"s":"{symbol}","i":"1h","o":"{open}","c":"{close}","h":"{high}","l":"{low}","v":"12.5","x":false}}}}"#,
        e = open_time + 1_000,
        t_end = open_time + HOUR - 1,
    )
}

#[test]
fn snapshot_fetch_populates_chart_stats_and_zones() {
    let mut engine = ChartEngine::new("BTCUSDT", Interval::H1).with_streaming(false);
    load(&mut engine);

    assert_eq!(engine.load_state(), &LoadState::Ready);
    assert_eq!(engine.series().len(), 100);

    let stats = engine.stats().unwrap();
    assert!(stats.is_positive);
    assert_eq!(stats.high, 115.0);

    // only 15m is on by default
    let zones = engine.patterns().zones(Interval::M15);
    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0].length, 6);
    assert!(zones[0].is_active);
    assert!(engine.patterns().zones(Interval::H4).is_empty());

    let frame = engine.render_frame();
    assert_eq!(frame.zones.len(), 1);
    assert_eq!(frame.zones[0].chart_start_index, 0);
    assert_eq!(frame.zones[0].chart_end_index, None);
    assert_eq!(frame.candles.len(), 50);
}

#[test]
fn streamed_ticks_update_then_append() {
    let mut engine = ChartEngine::new("BTCUSDT", Interval::H1).with_streaming(false);
    load(&mut engine);
    let last = *engine.series().last().unwrap();
    let window = engine.viewport().index_domain();

    // same bucket: widen high, move close
    let update = parse_kline_message(&kline_json(
        "BTCUSDT",
        last.timestamp_ms,
        last.open_price,
        last.high_price + 3.0,
        last.low_price,
        last.close_price + 2.0,
    ))
    .unwrap();
    assert_eq!(engine.apply_tick(&update), Reconciled::Updated { changed: true });
    assert_eq!(engine.series().last().unwrap().high_price, last.high_price + 3.0);
    assert_eq!(engine.viewport().index_domain(), window);

    // next bucket arrives through the channel like a live stream would deliver it
    let next = parse_kline_message(&kline_json(
        "BTCUSDT",
        last.timestamp_ms + HOUR,
        112.0,
        113.0,
        111.0,
        112.5,
    ))
    .unwrap();
    let (tx, rx) = channel();
    tx.send(DataEvent::Tick {
        key: engine.key().clone(),
        candle: next,
    })
    .unwrap();
    engine.process_events(&rx);

    assert_eq!(engine.series().len(), 101);
    assert_eq!(engine.series().current_price(), Some(112.5));
    assert_eq!(engine.viewport().index_domain().start, window.start + 1.0);

    // malformed message never reaches the store
    assert!(parse_kline_message(r#"{"e":"kline","k":{"t":1}}"#).is_none());
}

#[test]
fn switching_market_discards_late_events() {
    let mut engine = ChartEngine::new("BTCUSDT", Interval::H1).with_streaming(false);
    load(&mut engine);

    let requests = engine.set_market("ETHUSDT", Interval::H1);
    assert_eq!(requests.len(), 1 + Interval::PATTERN_TIMEFRAMES.len());
    assert!(engine.series().is_empty());
    assert!(engine.stats().is_none());

    let late = DataEvent::Snapshot {
        key: MarketKey::new("BTCUSDT", Interval::H1),
        target: SeriesTarget::Chart,
        candles: vec![Candle::new(HOUR, 1.0, 2.0, 0.5, 1.5, 1.0)],
    };
    assert!(!engine.handle_event(late));
    assert!(engine.series().is_empty());
    assert!(engine.load_state().is_loading());
}

#[test]
fn failed_fetch_surfaces_error_state() {
    let mut engine = ChartEngine::new("DOWNUSDT", Interval::H1).with_streaming(false);
    load(&mut engine);

    assert!(matches!(engine.load_state(), LoadState::Failed(msg) if msg.contains("exchange unavailable")));
    assert!(engine.series().is_empty());
    assert!(engine.render_frame().candles.is_empty());
}
