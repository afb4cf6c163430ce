use std::sync::mpsc::Receiver;

use crate::analysis::{DisplayZone, TimeframeAnalysis};
use crate::chart::{
    CandleGeometry, ChartDomain, ChartRange, IndexDomain, PriceLabels, TimeLabel, Viewport, candle_to_pixels,
    pixel_to_price, price_labels, time_labels, visible_indices,
};
use crate::config::{BINANCE, CHART, PatternSettings};
use crate::data::{Reconciled, SeriesStore};
use crate::domain::{Candle, ChartStats, Interval, MarketStats};
use crate::input::{
    AxisDrag, Crosshair, GestureState, HoverTracker, InteractionState, MouseController, ScreenPos,
    Tooltip, TouchGestures,
};
use crate::utils::{AppInstant, local_now_as_timestamp_ms};

#[cfg(debug_assertions)]
use crate::config::DF;

use super::messages::{DataEvent, MarketKey, SeriesTarget, SnapshotRequest};
use super::state::{ConnectionState, LoadState};

/// One candle ready to paint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedCandle {
    pub index: usize,
    pub candle: Candle,
    pub geometry: CandleGeometry,
}

/// Highest high or lowest low among the visible candles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceMarker {
    pub index: usize,
    pub price: f64,
}

/// Everything the viewer needs to draw one frame. Pixel values are relative to
/// the plot area's top-left corner.
#[derive(Debug, Clone)]
pub struct RenderFrame {
    pub domain: ChartDomain,
    pub range: ChartRange,
    pub candles: Vec<RenderedCandle>,
    pub zones: Vec<DisplayZone>,
    pub crosshair: Option<Crosshair>,
    /// Price under the crosshair's y position.
    pub crosshair_price: Option<f64>,
    pub is_dragging: bool,
    pub tooltip: Option<Tooltip>,
    pub price_labels: PriceLabels,
    pub time_labels: Vec<TimeLabel>,
    pub current_price: Option<f64>,
    pub visible_high: Option<PriceMarker>,
    pub visible_low: Option<PriceMarker>,
}

/// Single owner of all chart state for the selected market.
///
/// Background tasks never touch this directly: they report [`DataEvent`]s, which
/// the UI thread drains through [`ChartEngine::process_events`].
pub struct ChartEngine {
    key: MarketKey,
    chart_limit: i32,
    streaming: bool,

    series: SeriesStore,
    viewport: Viewport,
    patterns: TimeframeAnalysis,

    mouse: MouseController,
    touch: TouchGestures,
    hover: HoverTracker,
    interaction: InteractionState,

    market_stats: Option<MarketStats>,
    connection: ConnectionState,
    load_state: LoadState,
    /// Cleared whenever a fresh load starts; the first chart snapshot after that lays out the view.
    view_initialized: bool,
    /// Wall-clock ms of the last snapshot or tick that changed the chart series.
    last_update_ms: Option<i64>,
}

impl ChartEngine {
    pub fn new(symbol: impl Into<String>, interval: Interval) -> Self {
        Self {
            key: MarketKey::new(symbol, interval),
            chart_limit: BINANCE.rest.chart_limit,
            streaming: true,
            series: SeriesStore::new(BINANCE.rest.retention_limit),
            viewport: Viewport::default(),
            patterns: TimeframeAnalysis::default(),
            mouse: MouseController::new(),
            touch: TouchGestures::new(),
            hover: HoverTracker::new(),
            interaction: InteractionState::default(),
            market_stats: None,
            connection: ConnectionState::Offline,
            load_state: LoadState::Idle,
            view_initialized: false,
            last_update_ms: None,
        }
    }

    /// Number of candles requested for the chart snapshot.
    pub fn with_chart_limit(mut self, limit: i32) -> Self {
        self.chart_limit = limit.max(1);
        self
    }

    /// Cap on the live chart series.
    pub fn with_retention_limit(mut self, limit: usize) -> Self {
        self.series = SeriesStore::new(limit);
        self
    }

    /// Whether the host runs a live stream. Only affects the reported connection state.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn key(&self) -> &MarketKey {
        &self.key
    }

    pub fn symbol(&self) -> &str {
        &self.key.symbol
    }

    pub fn interval(&self) -> Interval {
        self.key.interval
    }

    pub fn series(&self) -> &SeriesStore {
        &self.series
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn patterns(&self) -> &TimeframeAnalysis {
        &self.patterns
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn gesture_state(&self) -> GestureState {
        self.touch.state()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    pub fn last_update_ms(&self) -> Option<i64> {
        self.last_update_ms
    }

    pub fn market_stats(&self) -> Option<&MarketStats> {
        self.market_stats.as_ref()
    }

    /// Snapshots needed to show the current market: the chart series, plus
    /// pattern history when `with_patterns` is set.
    pub fn snapshot_requests(&self, with_patterns: bool) -> Vec<SnapshotRequest> {
        let mut requests = vec![SnapshotRequest {
            key: self.key.clone(),
            target: SeriesTarget::Chart,
            limit: self.chart_limit,
        }];
        if with_patterns {
            requests.extend(Interval::PATTERN_TIMEFRAMES.iter().map(|&tf| SnapshotRequest {
                key: MarketKey::new(self.key.symbol.clone(), tf),
                target: SeriesTarget::Pattern,
                limit: BINANCE.rest.pattern_limit,
            }));
        }
        requests
    }

    /// Begin loading the current market from scratch.
    pub fn start_loading(&mut self) -> Vec<SnapshotRequest> {
        self.load_state = LoadState::Loading;
        self.view_initialized = false;
        if self.streaming {
            self.connection = ConnectionState::Connecting;
        }
        self.snapshot_requests(true)
    }

    /// Switch symbol and/or interval. Resets the chart series and view; pattern
    /// history is only refetched when the symbol changes.
    /// Returns the snapshots the host should fetch (empty if nothing changed).
    pub fn set_market(&mut self, symbol: &str, interval: Interval) -> Vec<SnapshotRequest> {
        let symbol_changed = symbol != self.key.symbol;
        if !symbol_changed && interval == self.key.interval {
            return Vec::new();
        }

        #[cfg(debug_assertions)]
        log::info!("ENGINE: market {} -> {}_{}", self.key, symbol, interval);

        self.key = MarketKey::new(symbol, interval);
        self.series = SeriesStore::new(self.series.limit());
        self.last_update_ms = None;
        let range = self.viewport.range();
        self.viewport = Viewport::new(range.width, range.height);
        self.reset_input();
        self.load_state = LoadState::Loading;
        self.view_initialized = false;
        if self.streaming {
            self.connection = ConnectionState::Connecting;
        }

        if symbol_changed {
            self.patterns.clear();
            self.market_stats = None;
        }
        self.snapshot_requests(symbol_changed)
    }

    fn reset_input(&mut self) {
        self.mouse.release(&mut self.interaction);
        self.touch.cancel(&mut self.interaction);
        self.hover.hide();
        self.interaction = InteractionState::default();
    }

    /// Drain every pending event. Returns how many were applied.
    pub fn process_events(&mut self, rx: &Receiver<DataEvent>) -> usize {
        let mut applied = 0;
        while let Ok(event) = rx.try_recv() {
            if self.handle_event(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Apply one event. Events for a market other than the current one are dropped.
    pub fn handle_event(&mut self, event: DataEvent) -> bool {
        match event {
            DataEvent::Snapshot {
                key,
                target: SeriesTarget::Chart,
                candles,
            } if key == self.key => {
                self.apply_snapshot(candles);
            }
            DataEvent::Snapshot {
                key,
                target: SeriesTarget::Pattern,
                candles,
            } if key.symbol == self.key.symbol => {
                self.patterns.replace_series(key.interval, candles);
                self.patterns.refresh();
            }
            DataEvent::SnapshotFailed { key, target, error } if key.symbol == self.key.symbol => {
                match target {
                    SeriesTarget::Chart if key == self.key => {
                        log::warn!("Chart snapshot for {} failed: {}", key, error);
                        self.load_state = LoadState::Failed(error);
                    }
                    SeriesTarget::Chart => return false,
                    SeriesTarget::Pattern => {
                        log::warn!("Pattern history for {} failed: {}", key, error);
                    }
                }
            }
            DataEvent::Stats { symbol, stats } if symbol == self.key.symbol => {
                self.market_stats = Some(stats);
            }
            DataEvent::StatsFailed { symbol, error } if symbol == self.key.symbol => {
                log::warn!("24h stats for {} failed: {}", symbol, error);
            }
            DataEvent::Tick { key, candle } if key == self.key => {
                self.apply_tick(&candle);
            }
            DataEvent::Connection { key, event } if key == self.key => {
                #[cfg(debug_assertions)]
                if DF.log_stream_updates {
                    log::info!("ENGINE: stream {} -> {:?}", key, event);
                }
                self.connection.apply(&event);
            }
            _other => {
                #[cfg(debug_assertions)]
                if DF.log_stream_updates {
                    log::info!("ENGINE: dropped stale event {:?}", _other);
                }
                return false;
            }
        }
        true
    }

    /// Replace the chart series. The first snapshot of a load lays out a fresh
    /// view, even if live ticks already arrived; later refreshes keep the user's
    /// window and only re-clamp it.
    pub fn apply_snapshot(&mut self, candles: Vec<Candle>) {
        let len = self.series.replace(candles);

        if !self.view_initialized && len > 0 {
            let range = self.viewport.range();
            self.viewport
                .initialize(self.series.candles(), range.width, range.height);
            self.view_initialized = true;
        } else {
            self.viewport.set_series_len(len);
        }
        self.load_state = LoadState::Ready;
        self.last_update_ms = Some(local_now_as_timestamp_ms());

        #[cfg(debug_assertions)]
        if DF.log_snapshots {
            log::info!("ENGINE: snapshot {} -> {} candles", self.key, len);
        }
    }

    /// Merge one live candle. The viewport shift for a new candle happens in the
    /// same call, so no frame sees the longer series with the old window.
    pub fn apply_tick(&mut self, candle: &Candle) -> Reconciled {
        let previous_len = self.series.len();
        let outcome = self.series.reconcile(candle);

        if outcome.is_new_candle() {
            let added = self.series.growth_since(previous_len);
            if added > 0 {
                self.viewport.shift_for_growth(added);
            } else {
                self.viewport.set_series_len(self.series.len());
            }
        }

        if outcome.changed() {
            self.last_update_ms = Some(local_now_as_timestamp_ms());
        }
        if outcome.changed() && self.key.interval.is_pattern_timeframe() {
            self.patterns.reconcile(self.key.interval, candle);
            self.patterns.refresh();
        }
        outcome
    }

    /// Header figures: 24h stats plus the live price, once both are known.
    pub fn stats(&self) -> Option<ChartStats> {
        let stats = self.market_stats.as_ref()?;
        let price = self.series.current_price()?;
        Some(ChartStats::new(stats, price))
    }

    // --- Patterns ---

    pub fn set_timeframe_enabled(&mut self, timeframe: Interval, enabled: bool) -> bool {
        let applied = self.patterns.set_enabled(timeframe, enabled);
        self.patterns.refresh();
        applied
    }

    pub fn toggle_timeframe(&mut self, timeframe: Interval) -> bool {
        let enabled = self.patterns.toggle(timeframe);
        self.patterns.refresh();
        enabled
    }

    pub fn set_pattern_settings(&mut self, settings: PatternSettings) {
        self.patterns.set_settings(settings);
        self.patterns.refresh();
    }

    // --- View ---

    pub fn resize(&mut self, width: f64, height: f64) -> bool {
        self.viewport.resize(width, height)
    }

    pub fn auto_fit(&mut self) -> bool {
        self.viewport.auto_fit_y(self.series.candles())
    }

    pub fn zoom(&mut self, factor: f64) -> bool {
        self.viewport.zoom_x(factor)
    }

    // --- Mouse ---

    pub fn mouse_press(&mut self, pos: ScreenPos) {
        self.mouse.press(pos, &mut self.interaction);
        self.hover.hide();
    }

    pub fn mouse_press_axis(&mut self, axis: AxisDrag, pos: ScreenPos) {
        self.mouse.press_axis(axis, pos, &mut self.interaction);
        self.hover.hide();
    }

    /// Returns `true` if a frame should be scheduled.
    pub fn mouse_move(&mut self, pos: ScreenPos, now: AppInstant) -> bool {
        let needs_frame = self.mouse.move_to(pos, &mut self.interaction);
        self.hover.pointer_move(
            pos,
            now,
            &self.viewport.index_domain(),
            &self.viewport.range(),
            self.series.len(),
            self.interaction.is_dragging,
        );
        needs_frame
    }

    pub fn mouse_release(&mut self) {
        self.mouse.release(&mut self.interaction);
    }

    pub fn mouse_leave(&mut self) {
        self.mouse.leave(&mut self.interaction);
        self.hover.pointer_leave();
    }

    pub fn wheel(&mut self, delta_y: f64, now: AppInstant) -> bool {
        self.mouse.wheel(delta_y, now, &mut self.viewport)
    }

    // --- Touch ---

    pub fn touch_start(&mut self, touches: &[ScreenPos], now: AppInstant) {
        self.touch.touch_start(touches, now, &mut self.interaction);
        match touches {
            [only] => self.hover.touch_start(
                *only,
                now,
                &self.viewport.index_domain(),
                &self.viewport.range(),
                self.series.len(),
                self.interaction.is_dragging,
            ),
            _ => self.hover.hide(),
        }
    }

    pub fn touch_move(&mut self, touches: &[ScreenPos]) -> bool {
        let needs_frame = self.touch.touch_move(touches, &mut self.interaction);
        if matches!(
            self.touch.state(),
            GestureState::Panning | GestureState::Pinching
        ) {
            self.hover.touch_move();
        }
        needs_frame
    }

    pub fn touch_end(&mut self, now: AppInstant) {
        self.touch.touch_end(now, &mut self.interaction);
        self.hover.touch_end(now);
    }

    pub fn touch_cancel(&mut self) {
        self.touch.cancel(&mut self.interaction);
        self.hover.hide();
    }

    // --- Frame loop ---

    /// Apply input buffered since the last frame. Returns whether the view moved.
    pub fn on_frame(&mut self) -> bool {
        let mouse = self.mouse.on_frame(&mut self.viewport);
        let touch = self.touch.on_frame(&mut self.viewport);
        mouse || touch
    }

    /// Fire due gesture and tooltip timers.
    pub fn tick(&mut self, now: AppInstant) -> bool {
        let touch = self.touch.tick(now, &mut self.interaction);
        let hover = self.hover.tick(now);
        touch || hover
    }

    /// When the host should wake up next even without input.
    pub fn next_deadline(&self) -> Option<AppInstant> {
        match (self.touch.next_deadline(), self.hover.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn render_frame(&self) -> RenderFrame {
        let domain = self.viewport.domain();
        let range = self.viewport.range();
        let candles = self.series.candles();

        let rendered = visible_indices(&domain.index, candles.len())
            .map(|indices| {
                indices
                    .map(|index| {
                        let candle = candles[index];
                        let mut geometry = candle_to_pixels(&candle, index, &domain, &range);
                        geometry.body_height = geometry.body_height.max(CHART.min_body_height_px);
                        RenderedCandle {
                            index,
                            candle,
                            geometry,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let crosshair = self.interaction.crosshair;
        let time_labels = self
            .visible_time_span()
            .map(|(start_ms, end_ms)| time_labels(start_ms, end_ms, range.width))
            .unwrap_or_default();

        let (visible_high, visible_low) = visible_extremes(candles, &domain.index).unzip();

        RenderFrame {
            domain,
            range,
            candles: rendered,
            zones: self.patterns.display_zones(candles),
            crosshair,
            crosshair_price: crosshair.map(|c| pixel_to_price(c.pos.y, &domain.price, &range)),
            is_dragging: self.interaction.is_dragging,
            tooltip: self
                .hover
                .tooltip(candles, &range, self.interaction.is_dragging),
            price_labels: price_labels(domain.price.min, domain.price.max, CHART.max_price_labels),
            time_labels,
            current_price: self.series.current_price(),
            visible_high,
            visible_low,
        }
    }

    /// Wall-clock span of the index window, extrapolated from the newest candle
    /// for indices outside the series.
    fn visible_time_span(&self) -> Option<(i64, i64)> {
        let last = self.series.last()?;
        let last_index = (self.series.len() - 1) as f64;
        let step = self.key.interval.as_ms() as f64;
        let at = |index: f64| last.timestamp_ms + ((index - last_index) * step).round() as i64;
        let domain = self.viewport.index_domain();
        Some((at(domain.start), at(domain.end)))
    }
}

/// Highest high and lowest low inside the index window. Ties keep the earliest candle.
fn visible_extremes(candles: &[Candle], domain: &IndexDomain) -> Option<(PriceMarker, PriceMarker)> {
    let mut indices = visible_indices(domain, candles.len())?;
    let first = indices.next()?;
    let seed = (
        PriceMarker {
            index: first,
            price: candles[first].high_price,
        },
        PriceMarker {
            index: first,
            price: candles[first].low_price,
        },
    );
    Some(indices.fold(seed, |(mut high, mut low), index| {
        let candle = &candles[index];
        if candle.high_price > high.price {
            high = PriceMarker {
                index,
                price: candle.high_price,
            };
        }
        if candle.low_price < low.price {
            low = PriceMarker {
                index,
                price: candle.low_price,
            };
        }
        (high, low)
    }))
}
