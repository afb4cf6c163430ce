//! Debugging feature flags.

#[allow(dead_code)]
pub struct LogFlags {
    /// Emit verbose logging for kline stream connections and ticks.
    pub log_stream_updates: bool,

    /// Log every reconcile decision (update / append / drop).
    pub log_candle_update: bool,

    /// Log zone counts whenever a timeframe is re-analysed.
    pub log_zones: bool,

    /// Log gesture state transitions (pending, panning, crosshair, pinching).
    pub log_gestures: bool,

    /// Log REST snapshot fetches.
    pub log_snapshots: bool,

    /// Activate trace_time macro (for cool scope-level timing)
    pub log_performance: bool,
}

pub const DF: LogFlags = LogFlags {
    log_snapshots: true,

    log_stream_updates: false,
    log_candle_update: false,
    log_zones: false,
    log_gestures: false,
    log_performance: false,
};
