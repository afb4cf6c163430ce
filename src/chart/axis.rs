//! Axis label generation: "nice" price steps and zoom-dependent time tiers.

use {
    crate::utils::TimeUtils,
    chrono::{DateTime, Utc},
};

/// Minimum horizontal spacing between time labels.
const MIN_GAP_PX: f64 = 100.0;
/// Extra tiers generated beyond each side so labels scroll in smoothly.
const BUFFER_TIERS: i64 = 2;

struct LabelTier {
    ms: i64,
    format: &'static str,
}

// Ascending, so the first tier wide enough wins.
const TIERS: &[LabelTier] = &[
    LabelTier { ms: 30 * TimeUtils::MS_IN_S, format: "%H:%M:%S" },
    LabelTier { ms: TimeUtils::MS_IN_MIN, format: "%H:%M" },
    LabelTier { ms: TimeUtils::MS_IN_5_MIN, format: "%H:%M" },
    LabelTier { ms: TimeUtils::MS_IN_15_MIN, format: "%H:%M" },
    LabelTier { ms: TimeUtils::MS_IN_30_MIN, format: "%H:%M" },
    LabelTier { ms: TimeUtils::MS_IN_H, format: "%H:%M" },
    LabelTier { ms: 2 * TimeUtils::MS_IN_H, format: "%d %H:00" },
    LabelTier { ms: TimeUtils::MS_IN_4_H, format: "%d %H:00" },
    LabelTier { ms: 6 * TimeUtils::MS_IN_H, format: "%d %H:00" },
    LabelTier { ms: 12 * TimeUtils::MS_IN_H, format: "%b %d %H:00" },
    LabelTier { ms: TimeUtils::MS_IN_D, format: "%b %d" },
    LabelTier { ms: 7 * TimeUtils::MS_IN_D, format: "%b %d" },
    LabelTier { ms: 30 * TimeUtils::MS_IN_D, format: "%Y %b" },
];

#[derive(Debug, Clone, PartialEq)]
pub struct PriceLabels {
    pub labels: Vec<f64>,
    pub step: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeLabel {
    pub timestamp_ms: i64,
    pub x: f64,
    pub text: String,
}

/// Price ticks on a 1/2/5 x 10^n grid, at most roughly `max_labels` of them.
pub fn price_labels(min_price: f64, max_price: f64, max_labels: usize) -> PriceLabels {
    let range = max_price - min_price;
    if !range.is_finite() || range <= 0.0 || max_labels < 2 {
        return PriceLabels {
            labels: vec![min_price, max_price],
            step: range.abs(),
        };
    }

    let rough_step = range / (max_labels - 1) as f64;
    let magnitude = 10f64.powf(rough_step.log10().floor());
    let normalized = rough_step / magnitude;
    let step = if normalized <= 1.0 {
        magnitude
    } else if normalized <= 2.0 {
        2.0 * magnitude
    } else if normalized <= 5.0 {
        5.0 * magnitude
    } else {
        10.0 * magnitude
    };

    let first = (min_price / step).ceil();
    let mut labels: Vec<f64> = (0..)
        .map(|i| (first + i as f64) * step)
        .take_while(|price| *price <= max_price)
        .collect();
    if labels.len() < 2 {
        labels.push(min_price);
        labels.push(max_price);
    }
    PriceLabels { labels, step }
}

/// Decimals follow the step: 4 below 0.01, 2 below 1, none otherwise.
pub fn format_price(price: f64, step: f64) -> String {
    let decimals = if step < 0.01 {
        4
    } else if step < 1.0 {
        2
    } else {
        0
    };
    let text = format!("{:.*}", decimals, price);
    group_thousands(&text)
}

fn group_thousands(text: &str) -> String {
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// Time ticks for the visible span `[start_ms, end_ms]` spread over `width` pixels.
/// Uses the smallest tier whose labels land at least `MIN_GAP_PX` apart.
pub fn time_labels(start_ms: i64, end_ms: i64, width: f64) -> Vec<TimeLabel> {
    if start_ms >= end_ms || !width.is_finite() || width <= 0.0 {
        return Vec::new();
    }

    let time_range = (end_ms - start_ms) as f64;
    let min_ms = time_range / width * MIN_GAP_PX;
    let tier = TIERS
        .iter()
        .find(|t| t.ms as f64 >= min_ms)
        .unwrap_or(&TIERS[TIERS.len() - 1]);
    let iv = tier.ms;

    let lower = start_ms - iv * BUFFER_TIERS;
    let first = lower.div_euclid(iv) * iv + if lower.rem_euclid(iv) > 0 { iv } else { 0 };
    let last = end_ms + iv * BUFFER_TIERS;

    (0..)
        .map(|i| first + i * iv)
        .take_while(|ts| *ts <= last)
        .map(|ts| TimeLabel {
            timestamp_ms: ts,
            x: (ts - start_ms) as f64 / time_range * width,
            text: format_timestamp(ts, tier.format),
        })
        .collect()
}

fn format_timestamp(ts: i64, format: &str) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ts) {
        Some(dt) => dt.format(format).to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_step_snaps_to_nice_values() {
        let result = price_labels(100.0, 200.0, 10);
        // rough step 11.1 -> 20
        assert_eq!(result.step, 20.0);
        assert_eq!(result.labels, vec![100.0, 120.0, 140.0, 160.0, 180.0, 200.0]);

        let small = price_labels(0.1234, 0.1301, 10);
        assert!((small.step - 0.001).abs() < 1e-12);
    }

    #[test]
    fn degenerate_price_range_returns_bounds() {
        let result = price_labels(5.0, 5.0, 10);
        assert_eq!(result.labels, vec![5.0, 5.0]);
    }

    #[test]
    fn price_formatting_tracks_step() {
        assert_eq!(format_price(64250.0, 50.0), "64,250");
        assert_eq!(format_price(1.5, 0.5), "1.50");
        assert_eq!(format_price(0.12345, 0.001), "0.1235");
        assert_eq!(format_price(-1234567.0, 1000.0), "-1,234,567");
    }

    #[test]
    fn time_tier_respects_minimum_gap() {
        // 50 hourly candles across 1000px: 20px per hour, so 100px needs the 6h tier
        let start = 1_700_000_000_000 - 1_700_000_000_000 % TimeUtils::MS_IN_D;
        let end = start + 50 * TimeUtils::MS_IN_H;
        let labels = time_labels(start, end, 1000.0);

        let gap = labels[1].timestamp_ms - labels[0].timestamp_ms;
        assert_eq!(gap, 6 * TimeUtils::MS_IN_H);
        assert!(labels.iter().all(|l| l.timestamp_ms % gap == 0));
        assert!(labels.first().is_some_and(|l| l.x < 0.0));
        assert!(labels.last().is_some_and(|l| l.x > 1000.0));
    }

    #[test]
    fn empty_span_has_no_time_labels() {
        assert!(time_labels(10, 10, 500.0).is_empty());
        assert!(time_labels(0, 10, 0.0).is_empty());
    }

    #[test]
    fn time_labels_render_in_utc() {
        let labels = time_labels(0, 10 * TimeUtils::MS_IN_MIN, 100.0);
        // 10 minutes over 100px: 6 minutes needed, 15m tier
        let midnight = labels.iter().find(|l| l.timestamp_ms == 0);
        assert_eq!(midnight.map(|l| l.text.as_str()), Some("00:00"));
    }
}
