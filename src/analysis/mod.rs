mod pattern;
mod timeframes;
mod zone_mapping;

pub use pattern::{PatternAnalyzer, PatternZone, ZoneKind};
pub use timeframes::TimeframeAnalysis;
pub use zone_mapping::{DisplayZone, find_index_by_timestamp, project_zone, project_zones};
