use chrono::{DateTime, Local};

/// Monotonic clock used by gesture timers and the perf macro.
pub type AppInstant = web_time::Instant;

pub struct TimeUtils;

impl TimeUtils {
    pub const MS_IN_S: i64 = 1000;
    pub const MS_IN_MIN: i64 = Self::MS_IN_S * 60;
    pub const MS_IN_5_MIN: i64 = Self::MS_IN_S * 60 * 5;
    pub const MS_IN_15_MIN: i64 = Self::MS_IN_S * 60 * 15;
    pub const MS_IN_30_MIN: i64 = Self::MS_IN_S * 60 * 30;
    pub const MS_IN_H: i64 = Self::MS_IN_MIN * 60;
    pub const MS_IN_4_H: i64 = Self::MS_IN_MIN * 60 * 4;
    pub const MS_IN_D: i64 = Self::MS_IN_H * 24;
    pub const STANDARD_TIME_FORMAT: &str = "%Y-%m-%d";
    pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
}

// Time Helper functions

pub fn epoch_ms_to_utc(epoch_ms: i64) -> String {
    // Used for display purposes
    match DateTime::from_timestamp_millis(epoch_ms) {
        Some(dt) => format!("{}", dt.format(TimeUtils::STANDARD_TIME_FORMAT)),
        None => "-".to_string(),
    }
}

/// Date and minute, for candle tooltips.
pub fn epoch_ms_to_utc_datetime(epoch_ms: i64) -> String {
    match DateTime::from_timestamp_millis(epoch_ms) {
        Some(dt) => format!("{}", dt.format(TimeUtils::DATE_TIME_FORMAT)),
        None => "-".to_string(),
    }
}

pub fn local_now_as_timestamp_ms() -> i64 {
    let now_local = Local::now();
    now_local.timestamp_millis()
}

pub fn format_duration(ms: i64) -> String {
    let secs = ms / 1000;
    if secs < 60 {
        return format!("{}s", secs);
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{}m", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }
    let days = hours / 24;
    format!("{}d", days)
}
