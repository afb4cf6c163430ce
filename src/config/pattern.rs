//! Pattern-zone detection defaults.

use {
    crate::domain::Interval,
    serde::{Deserialize, Serialize},
};

/// What happens to a zone once a later close breaks through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BreakAction {
    /// Keep drawing the zone, ending at the breaking candle.
    #[default]
    Cut,
    /// Stop drawing the zone altogether.
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternSettings {
    pub enabled: bool,
    /// Shortest run of same-direction candles that forms a zone.
    pub min_length: usize,
    pub break_action: BreakAction,
    /// Only the most recent zones are kept.
    pub max_zones: usize,
}

impl Default for PatternSettings {
    fn default() -> Self {
        PATTERNS
    }
}

pub const PATTERNS: PatternSettings = PatternSettings {
    enabled: true,
    min_length: 5,
    break_action: BreakAction::Cut,
    max_zones: 200,
};

/// Pattern timeframes drawn on the chart after a fresh start.
pub const DEFAULT_ENABLED_TIMEFRAMES: &[Interval] = &[Interval::M15];
