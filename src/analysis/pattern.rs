use {
    crate::{
        config::PatternSettings,
        domain::{Candle, CandleDirection, Interval},
        trace_time,
    },
    serde::{Deserialize, Serialize},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneKind {
    Bullish,
    Bearish,
}

/// Price band anchored on the first candle of a same-direction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternZone {
    /// `{timeframe}-{start_index}`, unique within one analysis.
    pub id: String,
    pub kind: ZoneKind,
    pub timeframe: Interval,
    pub start_index: usize,
    pub end_index: usize,
    pub length: usize,
    pub start_timestamp_ms: i64,
    pub end_timestamp_ms: i64,
    pub zone_top: f64,
    pub zone_bottom: f64,
    pub is_active: bool,
    pub broken_at_timestamp_ms: Option<i64>,
}

impl PatternZone {
    /// Does a close at `price` break this zone?
    pub fn is_breached_by(&self, price: f64) -> bool {
        match self.kind {
            ZoneKind::Bullish => price < self.zone_bottom,
            ZoneKind::Bearish => price > self.zone_top,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Run {
    kind: ZoneKind,
    start: usize,
    length: usize,
}

fn zone_kind(candle: &Candle) -> Option<ZoneKind> {
    match candle.direction() {
        CandleDirection::Bullish => Some(ZoneKind::Bullish),
        CandleDirection::Bearish => Some(ZoneKind::Bearish),
        CandleDirection::Neutral => None,
    }
}

pub struct PatternAnalyzer;

impl PatternAnalyzer {
    /// Full scan of one timeframe: runs of at least `min_length` same-direction candles
    /// become zones (most recent `max_zones` kept), each checked for a later breakout.
    pub fn analyze(
        candles: &[Candle],
        timeframe: Interval,
        settings: &PatternSettings,
    ) -> Vec<PatternZone> {
        trace_time!("PatternAnalyzer::analyze", 2_000, {
            let min_length = settings.min_length.max(1);
            if candles.len() < min_length || settings.max_zones == 0 {
                return Vec::new();
            }

            let mut runs = Self::find_runs(candles, min_length);
            if runs.len() > settings.max_zones {
                runs.drain(..runs.len() - settings.max_zones);
            }

            runs.into_iter()
                .map(|run| {
                    let mut zone = Self::zone_from_run(candles, timeframe, run);
                    if let Some(broken_at) = Self::find_break(candles, &zone) {
                        zone.is_active = false;
                        zone.broken_at_timestamp_ms = Some(candles[broken_at].timestamp_ms);
                    }
                    zone
                })
                .collect()
        })
    }

    /// Maximal runs of one direction. A doji ends a run and starts none.
    fn find_runs(candles: &[Candle], min_length: usize) -> Vec<Run> {
        let mut runs = Vec::new();
        let mut current: Option<Run> = None;

        for (i, candle) in candles.iter().enumerate() {
            let kind = zone_kind(candle);
            match (current.as_mut(), kind) {
                (Some(run), Some(k)) if run.kind == k => run.length += 1,
                _ => {
                    if let Some(run) = current.take()
                        && run.length >= min_length
                    {
                        runs.push(run);
                    }
                    current = kind.map(|kind| Run {
                        kind,
                        start: i,
                        length: 1,
                    });
                }
            }
        }
        if let Some(run) = current
            && run.length >= min_length
        {
            runs.push(run);
        }
        runs
    }

    fn zone_from_run(candles: &[Candle], timeframe: Interval, run: Run) -> PatternZone {
        let end = run.start + run.length - 1;
        let first = &candles[run.start];
        PatternZone {
            id: format!("{}-{}", timeframe, run.start),
            kind: run.kind,
            timeframe,
            start_index: run.start,
            end_index: end,
            length: run.length,
            start_timestamp_ms: first.timestamp_ms,
            end_timestamp_ms: candles[end].timestamp_ms,
            zone_top: first.body_top(),
            zone_bottom: first.body_bottom(),
            is_active: true,
            broken_at_timestamp_ms: None,
        }
    }

    /// Index of the first candle after the run whose close breaches the zone.
    fn find_break(candles: &[Candle], zone: &PatternZone) -> Option<usize> {
        candles
            .iter()
            .enumerate()
            .skip(zone.end_index + 1)
            .find(|(_, c)| zone.is_breached_by(c.close_price))
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PATTERNS;

    fn bar(i: usize, open: f64, close: f64) -> Candle {
        let ts = 1_000 + i as i64 * 60_000;
        Candle::new(ts, open, open.max(close) + 0.5, open.min(close) - 0.5, close, 1.0)
    }

    /// Closes given; opens are one less (bullish) except where stated.
    fn series(pairs: &[(f64, f64)]) -> Vec<Candle> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, &(open, close))| bar(i, open, close))
            .collect()
    }

    fn six_up_one_down() -> Vec<(f64, f64)> {
        vec![
            (1.0, 2.0),
            (2.0, 3.0),
            (3.0, 4.0),
            (4.0, 5.0),
            (5.0, 6.0),
            (6.0, 7.0),
            (7.0, 4.0),
        ]
    }

    #[test]
    fn six_bullish_candles_form_one_zone() {
        let candles = series(&six_up_one_down());
        let zones = PatternAnalyzer::analyze(&candles, Interval::M15, &PATTERNS);

        assert_eq!(zones.len(), 1);
        let zone = &zones[0];
        assert_eq!(zone.kind, ZoneKind::Bullish);
        assert_eq!((zone.start_index, zone.end_index, zone.length), (0, 5, 6));
        assert_eq!(zone.id, "15m-0");
        assert_eq!(zone.zone_bottom, 1.0);
        assert_eq!(zone.zone_top, 2.0);
        assert_eq!(zone.start_timestamp_ms, candles[0].timestamp_ms);
        assert_eq!(zone.end_timestamp_ms, candles[5].timestamp_ms);
        // close of 4 stays above the anchor body
        assert!(zone.is_active);
    }

    #[test]
    fn later_close_below_bottom_breaks_bullish_zone() {
        let mut pairs = six_up_one_down();
        pairs.push((4.0, 3.0));
        pairs.push((3.0, 0.5));
        pairs.push((0.5, 0.2));
        let candles = series(&pairs);
        let zones = PatternAnalyzer::analyze(&candles, Interval::H1, &PATTERNS);

        let zone = &zones[0];
        assert!(!zone.is_active);
        // first breach wins
        assert_eq!(zone.broken_at_timestamp_ms, Some(candles[8].timestamp_ms));
    }

    #[test]
    fn close_inside_body_does_not_break() {
        let mut pairs = six_up_one_down();
        pairs.push((4.0, 3.0));
        pairs.push((3.0, 1.5));
        let candles = series(&pairs);
        let zones = PatternAnalyzer::analyze(&candles, Interval::H1, &PATTERNS);
        assert!(zones[0].is_active);
        assert_eq!(zones[0].broken_at_timestamp_ms, None);
    }

    #[test]
    fn bearish_zone_breaks_on_close_above_top() {
        let mut pairs: Vec<(f64, f64)> = (0..5)
            .map(|i| (20.0 - i as f64, 19.0 - i as f64))
            .collect();
        pairs.push((15.0, 15.5));
        pairs.push((15.5, 20.5));
        let candles = series(&pairs);
        let zones = PatternAnalyzer::analyze(&candles, Interval::H4, &PATTERNS);

        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].kind, ZoneKind::Bearish);
        assert_eq!(zones[0].zone_top, 20.0);
        assert_eq!(zones[0].broken_at_timestamp_ms, Some(candles[6].timestamp_ms));
    }

    #[test]
    fn doji_splits_runs() {
        let mut pairs: Vec<(f64, f64)> = (0..3).map(|i| (i as f64, i as f64 + 1.0)).collect();
        pairs.push((3.0, 3.0));
        pairs.extend((4..7).map(|i| (i as f64, i as f64 + 1.0)));
        let candles = series(&pairs);
        assert!(PatternAnalyzer::analyze(&candles, Interval::M15, &PATTERNS).is_empty());
    }

    #[test]
    fn run_reaching_the_end_is_emitted() {
        let pairs: Vec<(f64, f64)> = (0..5).map(|i| (i as f64, i as f64 + 1.0)).collect();
        let zones = PatternAnalyzer::analyze(&series(&pairs), Interval::M30, &PATTERNS);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].end_index, 4);
    }

    #[test]
    fn short_series_yields_nothing() {
        let pairs = vec![(1.0, 2.0), (2.0, 3.0)];
        assert!(PatternAnalyzer::analyze(&series(&pairs), Interval::M15, &PATTERNS).is_empty());
    }

    #[test]
    fn only_most_recent_zones_are_kept() {
        // 300 alternating runs of 5 up / 5 down
        let mut pairs = Vec::new();
        for run in 0..300 {
            for _ in 0..5 {
                if run % 2 == 0 {
                    pairs.push((100.0, 101.0));
                } else {
                    pairs.push((101.0, 100.0));
                }
            }
        }
        let candles = series(&pairs);
        let zones = PatternAnalyzer::analyze(&candles, Interval::M15, &PATTERNS);

        assert_eq!(zones.len(), 200);
        assert_eq!(zones[0].start_index, 100 * 5);
        assert_eq!(zones[199].start_index, 299 * 5);
        assert!(zones.windows(2).all(|w| w[0].start_index < w[1].start_index));
    }
}
