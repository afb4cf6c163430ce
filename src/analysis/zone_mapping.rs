//! Projection of pattern zones from their own timeframe onto the displayed series.

use {
    super::pattern::PatternZone,
    crate::{config::BreakAction, domain::Candle},
};

/// Nearest candle index for `timestamp_ms`. Out-of-range timestamps clamp to the
/// first/last candle; an exact midpoint resolves to the later candle.
pub fn find_index_by_timestamp(candles: &[Candle], timestamp_ms: i64) -> usize {
    let (Some(first), Some(last)) = (candles.first(), candles.last()) else {
        return 0;
    };
    if timestamp_ms <= first.timestamp_ms {
        return 0;
    }
    if timestamp_ms >= last.timestamp_ms {
        return candles.len() - 1;
    }

    // First candle at or after the target; both neighbours exist past the guards above.
    let after = candles.partition_point(|c| c.timestamp_ms < timestamp_ms);
    if candles[after].timestamp_ms == timestamp_ms {
        return after;
    }
    let before = after - 1;
    let diff_after = candles[after].timestamp_ms - timestamp_ms;
    let diff_before = timestamp_ms - candles[before].timestamp_ms;
    if diff_after <= diff_before { after } else { before }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayZone {
    pub zone: PatternZone,
    pub chart_start_index: usize,
    /// `None` while the zone is active: it runs to the right edge.
    pub chart_end_index: Option<usize>,
}

pub fn project_zone(zone: &PatternZone, main: &[Candle]) -> DisplayZone {
    DisplayZone {
        zone: zone.clone(),
        chart_start_index: find_index_by_timestamp(main, zone.start_timestamp_ms),
        chart_end_index: zone
            .broken_at_timestamp_ms
            .filter(|_| !zone.is_active)
            .map(|ts| find_index_by_timestamp(main, ts)),
    }
}

pub fn project_zones<'a>(
    zones: impl IntoIterator<Item = &'a PatternZone>,
    main: &[Candle],
    break_action: BreakAction,
) -> Vec<DisplayZone> {
    if main.is_empty() {
        return Vec::new();
    }
    zones
        .into_iter()
        .filter(|z| z.is_active || break_action == BreakAction::Cut)
        .map(|z| project_zone(z, main))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analysis::ZoneKind, domain::Interval};

    fn candles_at(timestamps: &[i64]) -> Vec<Candle> {
        timestamps
            .iter()
            .map(|&ts| Candle::new(ts, 1.0, 2.0, 0.5, 1.5, 1.0))
            .collect()
    }

    fn zone(start: i64, broken: Option<i64>) -> PatternZone {
        PatternZone {
            id: format!("4h-{start}"),
            kind: ZoneKind::Bullish,
            timeframe: Interval::H4,
            start_index: 0,
            end_index: 4,
            length: 5,
            start_timestamp_ms: start,
            end_timestamp_ms: start + 4,
            zone_top: 2.0,
            zone_bottom: 1.0,
            is_active: broken.is_none(),
            broken_at_timestamp_ms: broken,
        }
    }

    #[test]
    fn empty_series_maps_to_zero() {
        assert_eq!(find_index_by_timestamp(&[], 123), 0);
    }

    #[test]
    fn clamps_outside_the_series() {
        let candles = candles_at(&[100, 200, 300]);
        assert_eq!(find_index_by_timestamp(&candles, 50), 0);
        assert_eq!(find_index_by_timestamp(&candles, 100), 0);
        assert_eq!(find_index_by_timestamp(&candles, 300), 2);
        assert_eq!(find_index_by_timestamp(&candles, 10_000), 2);
    }

    #[test]
    fn picks_the_nearer_neighbour() {
        let candles = candles_at(&[100, 200, 300, 400]);
        assert_eq!(find_index_by_timestamp(&candles, 200), 1);
        assert_eq!(find_index_by_timestamp(&candles, 240), 1);
        assert_eq!(find_index_by_timestamp(&candles, 260), 2);
        // midpoint goes to the later candle
        assert_eq!(find_index_by_timestamp(&candles, 250), 2);
    }

    #[test]
    fn active_zone_has_open_end() {
        let main = candles_at(&[100, 200, 300, 400]);
        let shown = project_zones([&zone(190, None)], &main, BreakAction::Cut);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].chart_start_index, 1);
        assert_eq!(shown[0].chart_end_index, None);
    }

    #[test]
    fn broken_zone_is_cut_or_deleted() {
        let main = candles_at(&[100, 200, 300, 400]);
        let zones = [zone(100, Some(390)), zone(200, None)];

        let cut = project_zones(&zones, &main, BreakAction::Cut);
        assert_eq!(cut.len(), 2);
        assert_eq!(cut[0].chart_end_index, Some(3));

        let deleted = project_zones(&zones, &main, BreakAction::Delete);
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].zone.start_timestamp_ms, 200);
    }

    #[test]
    fn no_main_series_no_zones() {
        assert!(project_zones(&[zone(100, None)], &[], BreakAction::Cut).is_empty());
    }
}
