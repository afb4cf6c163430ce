use {
    eframe::{
        Frame, Storage,
        egui::{
            CentralPanel, Context, Event, Pos2, Rect, Sense, TopBottomPanel, TouchId, TouchPhase,
        },
    },
    serde::{Deserialize, Serialize},
    std::{
        collections::HashMap,
        sync::{
            Arc,
            mpsc::{self, Receiver, Sender},
        },
        time::Duration,
    },
};

use crate::{
    Cli,
    config::DEFAULT_ENABLED_TIMEFRAMES,
    data::{BinanceProvider, KlineStream, MarketDataProvider, spawn_snapshot_fetch},
    domain::{DEFAULT_INTERVAL, DEFAULT_SYMBOL, Interval},
    engine::{ChartEngine, DataEvent, SnapshotRequest},
    input::{AxisDrag, ScreenPos},
    ui::{
        UI_CONFIG,
        painter::{ChartLayout, paint_chart},
        panels::{HeaderAction, render_header, render_status_bar},
    },
    utils::AppInstant,
};

#[cfg(debug_assertions)]
use crate::config::DF;

/// What survives a restart.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
struct ViewPrefs {
    symbol: String,
    interval: Interval,
    enabled_timeframes: Vec<Interval>,
}

impl Default for ViewPrefs {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            interval: DEFAULT_INTERVAL,
            enabled_timeframes: DEFAULT_ENABLED_TIMEFRAMES.to_vec(),
        }
    }
}

/// Fingers currently down on the plot, in plot-local coordinates.
/// Keyed by the raw touch id; `TouchId` itself is not hashable.
#[derive(Debug, Default)]
struct ActiveTouches(HashMap<u64, ScreenPos>);

impl ActiveTouches {
    fn insert(&mut self, id: TouchId, pos: ScreenPos) {
        self.0.insert(id.0, pos);
    }

    /// Returns `false` for a finger that never started on the plot.
    fn update(&mut self, id: TouchId, pos: ScreenPos) -> bool {
        match self.0.get_mut(&id.0) {
            Some(slot) => {
                *slot = pos;
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, id: TouchId) -> bool {
        self.0.remove(&id.0).is_some()
    }

    fn points(&self) -> Vec<ScreenPos> {
        self.0.values().copied().collect()
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn clear(&mut self) {
        self.0.clear();
    }
}

pub struct App {
    engine: ChartEngine,
    provider: Arc<dyn MarketDataProvider>,
    data_tx: Sender<DataEvent>,
    data_rx: Receiver<DataEvent>,
    stream: Option<KlineStream>,
    streaming: bool,
    touches: ActiveTouches,
    pointer_in_plot: bool,
}

impl App {
    pub(crate) fn new(cc: &eframe::CreationContext<'_>, args: Cli) -> Self {
        let prefs: ViewPrefs = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();

        let symbol = args.symbol.clone().unwrap_or(prefs.symbol);
        let interval = args.interval.unwrap_or(prefs.interval);
        let streaming = !args.no_stream;

        let mut engine = ChartEngine::new(symbol, interval)
            .with_chart_limit(args.limit)
            .with_streaming(streaming);
        for tf in Interval::PATTERN_TIMEFRAMES {
            engine.set_timeframe_enabled(tf, prefs.enabled_timeframes.contains(&tf));
        }

        let (data_tx, data_rx) = mpsc::channel();
        let mut app = Self {
            engine,
            provider: Arc::new(BinanceProvider::new()),
            data_tx,
            data_rx,
            stream: None,
            streaming,
            touches: ActiveTouches::default(),
            pointer_in_plot: false,
        };

        let requests = app.engine.start_loading();
        app.fetch(requests, true);
        app.restart_stream();
        app
    }

    fn fetch(&self, requests: Vec<SnapshotRequest>, with_stats: bool) {
        if requests.is_empty() {
            return;
        }
        let stats_symbol = with_stats.then(|| self.engine.symbol().to_string());
        // Detached: results come back through the channel.
        let _ = spawn_snapshot_fetch(
            self.provider.clone(),
            requests,
            stats_symbol,
            self.data_tx.clone(),
        );
    }

    fn restart_stream(&mut self) {
        if let Some(mut old) = self.stream.take() {
            old.disconnect();
        }
        if !self.streaming {
            return;
        }
        let mut stream = KlineStream::new(self.engine.key().clone());
        stream.connect(self.data_tx.clone());
        self.stream = Some(stream);
    }

    fn switch_market(&mut self, symbol: &str, interval: Interval) {
        let symbol_changed = symbol != self.engine.symbol();
        let requests = self.engine.set_market(symbol, interval);
        if requests.is_empty() {
            return;
        }
        self.touches.clear();
        self.fetch(requests, symbol_changed);
        self.restart_stream();
    }

    fn handle_header_action(&mut self, action: HeaderAction) {
        match action {
            HeaderAction::Symbol(symbol) => {
                let interval = self.engine.interval();
                self.switch_market(&symbol, interval);
            }
            HeaderAction::Interval(interval) => {
                let symbol = self.engine.symbol().to_string();
                self.switch_market(&symbol, interval);
            }
            HeaderAction::ToggleTimeframe(tf) => {
                self.engine.toggle_timeframe(tf);
            }
            HeaderAction::Reload => {
                let requests = self.engine.start_loading();
                self.fetch(requests, true);
                self.restart_stream();
            }
            HeaderAction::Reconnect => self.restart_stream(),
        }
    }

    /// Feed this frame's pointer, wheel and touch input into the engine.
    fn handle_input(&mut self, ctx: &Context, layout: &ChartLayout) {
        let now = AppInstant::now();
        let origin = layout.plot.min;
        let local = |p: Pos2| ScreenPos::new((p.x - origin.x) as f64, (p.y - origin.y) as f64);

        let (events, any_touches, latest_pos, pressed, released, scroll_y, double_clicked) =
            ctx.input(|i| {
                (
                    i.events.clone(),
                    i.any_touches(),
                    i.pointer.latest_pos(),
                    i.pointer.primary_pressed(),
                    i.pointer.primary_released(),
                    i.raw_scroll_delta.y,
                    i.pointer.button_double_clicked(eframe::egui::PointerButton::Primary),
                )
            });

        for event in &events {
            if let Event::Touch { id, phase, pos, .. } = event {
                self.handle_touch(*id, *phase, local(*pos), layout.plot.contains(*pos), now);
            }
        }
        // egui mirrors touches as pointer events; let the touch path own them.
        if any_touches || !self.touches.is_empty() {
            return;
        }

        if pressed && let Some(pos) = latest_pos {
            if layout.plot.contains(pos) {
                self.engine.mouse_press(local(pos));
            } else if layout.price_axis.contains(pos) {
                self.engine.mouse_press_axis(AxisDrag::Price, local(pos));
            } else if layout.time_axis.contains(pos) {
                self.engine.mouse_press_axis(AxisDrag::Time, local(pos));
            }
        }

        if let Some(pos) = latest_pos {
            let inside = layout.plot.contains(pos);
            if inside || self.engine.interaction().is_dragging {
                self.engine.mouse_move(local(pos), now);
            } else if self.pointer_in_plot {
                self.engine.mouse_leave();
            }
            self.pointer_in_plot = inside;
        } else if self.pointer_in_plot {
            self.engine.mouse_leave();
            self.pointer_in_plot = false;
        }

        if released {
            self.engine.mouse_release();
        }
        if self.pointer_in_plot && scroll_y != 0.0 {
            // egui reports wheel-up as positive; zoom out on wheel-down
            self.engine.wheel(-scroll_y as f64, now);
        }
        if self.pointer_in_plot && double_clicked {
            self.engine.auto_fit();
        }
    }

    fn handle_touch(
        &mut self,
        id: TouchId,
        phase: TouchPhase,
        pos: ScreenPos,
        in_plot: bool,
        now: AppInstant,
    ) {
        match phase {
            TouchPhase::Start if in_plot => {
                self.touches.insert(id, pos);
                self.engine.touch_start(&self.touches.points(), now);
            }
            TouchPhase::Move => {
                if self.touches.update(id, pos) {
                    self.engine.touch_move(&self.touches.points());
                }
            }
            TouchPhase::End => {
                if self.touches.remove(id) {
                    self.engine.touch_end(now);
                }
            }
            TouchPhase::Cancel => {
                if self.touches.remove(id) {
                    self.engine.touch_cancel();
                }
            }
            TouchPhase::Start => {}
        }
    }

    fn schedule_repaint(&self, ctx: &Context, now: AppInstant) {
        let poll = Duration::from_millis(UI_CONFIG.repaint_poll_ms);
        let wait = self
            .engine
            .next_deadline()
            .map(|at| at.saturating_duration_since(now).min(poll))
            .unwrap_or(poll);
        ctx.request_repaint_after(wait);
    }
}

impl eframe::App for App {
    fn save(&mut self, storage: &mut dyn Storage) {
        let prefs = ViewPrefs {
            symbol: self.engine.symbol().to_string(),
            interval: self.engine.interval(),
            enabled_timeframes: self.engine.patterns().enabled_timeframes(),
        };
        eframe::set_value(storage, eframe::APP_KEY, &prefs);
    }

    fn update(&mut self, ctx: &Context, _frame: &mut Frame) {
        let _applied = self.engine.process_events(&self.data_rx);
        #[cfg(debug_assertions)]
        if DF.log_stream_updates && _applied > 0 {
            log::info!("UI: applied {} data events", _applied);
        }

        TopBottomPanel::top("header")
            .frame(UI_CONFIG.top_panel_frame())
            .show(ctx, |ui| {
                if let Some(action) = render_header(ui, &self.engine) {
                    self.handle_header_action(action);
                }
            });

        TopBottomPanel::bottom("status")
            .frame(UI_CONFIG.bottom_panel_frame())
            .show(ctx, |ui| render_status_bar(ui, &self.engine));

        CentralPanel::default()
            .frame(UI_CONFIG.central_panel_frame())
            .show(ctx, |ui| {
                let outer: Rect = ui.available_rect_before_wrap();
                let (_, _response) = ui.allocate_exact_size(outer.size(), Sense::click_and_drag());
                let layout = ChartLayout::split(outer);

                self.engine
                    .resize(layout.plot.width() as f64, layout.plot.height() as f64);
                self.handle_input(ctx, &layout);

                let now = AppInstant::now();
                self.engine.on_frame();
                self.engine.tick(now);

                let frame = self.engine.render_frame();
                paint_chart(ui.painter(), &layout, &frame);
                self.schedule_repaint(ctx, now);
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touches_tracked_by_id() {
        let mut touches = ActiveTouches::default();
        let (a, b) = (TouchId(1), TouchId(2));

        touches.insert(a, ScreenPos::new(10.0, 10.0));
        touches.insert(b, ScreenPos::new(50.0, 10.0));
        assert_eq!(touches.points().len(), 2);

        assert!(touches.update(a, ScreenPos::new(20.0, 10.0)));
        assert!(!touches.update(TouchId(9), ScreenPos::new(0.0, 0.0)));
        assert!(touches.points().contains(&ScreenPos::new(20.0, 10.0)));

        assert!(touches.remove(a));
        assert!(!touches.remove(a));
        assert_eq!(touches.points(), vec![ScreenPos::new(50.0, 10.0)]);

        touches.clear();
        assert!(touches.is_empty());
    }
}
