mod perf;
mod time_utils;

pub use time_utils::{
    AppInstant, TimeUtils, epoch_ms_to_utc, epoch_ms_to_utc_datetime, format_duration, local_now_as_timestamp_ms,
};
