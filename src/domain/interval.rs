use {
    crate::utils::TimeUtils,
    serde::{Deserialize, Serialize},
    strum_macros::{Display, EnumIter, EnumString},
};

/// Kline bucket width, rendered with the Binance shorthand (`15m`, `4h`, ...).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    Default,
)]
pub enum Interval {
    #[strum(serialize = "1m")]
    M1,
    #[strum(serialize = "5m")]
    M5,
    #[strum(serialize = "15m")]
    M15,
    #[strum(serialize = "30m")]
    M30,
    #[default]
    #[strum(serialize = "1h")]
    H1,
    #[strum(serialize = "4h")]
    H4,
    #[strum(serialize = "1d")]
    D1,
}

impl Interval {
    /// Timeframes scanned for pattern zones.
    pub const PATTERN_TIMEFRAMES: [Interval; 4] =
        [Interval::M15, Interval::M30, Interval::H1, Interval::H4];

    pub fn as_ms(&self) -> i64 {
        use TimeUtils as T;
        match self {
            Self::M1 => T::MS_IN_MIN,
            Self::M5 => T::MS_IN_5_MIN,
            Self::M15 => T::MS_IN_15_MIN,
            Self::M30 => T::MS_IN_30_MIN,
            Self::H1 => T::MS_IN_H,
            Self::H4 => T::MS_IN_4_H,
            Self::D1 => T::MS_IN_D,
        }
    }

    pub fn is_pattern_timeframe(&self) -> bool {
        Self::PATTERN_TIMEFRAMES.contains(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn shorthand_round_trips_through_from_str() {
        for interval in Interval::iter() {
            let text = interval.to_string();
            assert_eq!(Interval::from_str(&text).ok(), Some(interval));
        }
        assert!(Interval::from_str("7m").is_err());
    }

    #[test]
    fn pattern_timeframes_are_ordered_by_width() {
        let widths: Vec<i64> = Interval::PATTERN_TIMEFRAMES
            .iter()
            .map(Interval::as_ms)
            .collect();
        assert!(widths.windows(2).all(|w| w[0] < w[1]));
        assert!(!Interval::D1.is_pattern_timeframe());
    }
}
