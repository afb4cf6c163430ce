mod core;
mod messages;
mod state;

pub use core::{ChartEngine, PriceMarker, RenderFrame, RenderedCandle};
pub use messages::{ConnectionEvent, DataEvent, MarketKey, SeriesTarget, SnapshotRequest};
pub use state::{ConnectionState, LoadState};
