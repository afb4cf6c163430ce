use {
    eframe::egui::{Color32, ComboBox, FontId, RichText, Ui},
    strum::IntoEnumIterator,
};

use crate::{
    chart::format_price,
    config::PLOT_CONFIG,
    domain::{CHART_SYMBOLS, Interval},
    engine::{ChartEngine, ConnectionState, LoadState},
    ui::{UiStyleExt, get_outcome_color},
    utils::{epoch_ms_to_utc, format_duration, local_now_as_timestamp_ms},
};

/// User requests raised by the header; applied by the app after the panel is drawn.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum HeaderAction {
    Symbol(String),
    Interval(Interval),
    ToggleTimeframe(Interval),
    Reload,
    Reconnect,
}

pub(crate) fn render_header(ui: &mut Ui, engine: &ChartEngine) -> Option<HeaderAction> {
    let mut action = None;

    ui.horizontal(|ui| {
        let mut symbol = engine.symbol().to_string();
        ComboBox::from_id_salt("symbol_select")
            .selected_text(RichText::new(&symbol).strong())
            .show_ui(ui, |ui| {
                for s in CHART_SYMBOLS {
                    ui.selectable_value(&mut symbol, s.to_string(), *s);
                }
            });
        if symbol != engine.symbol() {
            action = Some(HeaderAction::Symbol(symbol));
        }

        ui.separator();
        for interval in Interval::iter() {
            let selected = interval == engine.interval();
            if ui
                .interactive_label(
                    &interval.to_string(),
                    selected,
                    PLOT_CONFIG.color_text_subdued,
                    FontId::proportional(12.0),
                )
                .clicked()
                && !selected
            {
                action = Some(HeaderAction::Interval(interval));
            }
        }

        ui.separator();
        ui.label_heading("Zones");
        for tf in Interval::PATTERN_TIMEFRAMES {
            let enabled = engine.patterns().is_enabled(tf);
            let color = PLOT_CONFIG.zone_color(tf);
            if ui
                .interactive_label(&tf.to_string(), enabled, color, FontId::proportional(12.0))
                .clicked()
            {
                action = Some(HeaderAction::ToggleTimeframe(tf));
            }
        }

        ui.separator();
        if let Some(stats) = engine.stats() {
            let color = get_outcome_color(stats.price_change);
            ui.label(
                RichText::new(format_price(stats.current_price, 0.01))
                    .strong()
                    .color(color),
            );
            ui.metric(
                "24h",
                &format!("{:+.2} ({:+.2}%)", stats.price_change, stats.price_change_pct),
                color,
            );
            ui.metric("H", &format_price(stats.high, 0.01), PLOT_CONFIG.color_text_primary);
            ui.metric("L", &format_price(stats.low, 0.01), PLOT_CONFIG.color_text_primary);
            ui.metric("Vol", &format_price(stats.volume, 1.0), PLOT_CONFIG.color_text_primary);
        } else if let Some(price) = engine.series().current_price() {
            ui.label(RichText::new(format_price(price, 0.01)).strong());
        }
    });

    action.or_else(|| render_connection_controls(ui, engine))
}

fn render_connection_controls(ui: &mut Ui, engine: &ChartEngine) -> Option<HeaderAction> {
    let mut action = None;
    ui.horizontal(|ui| {
        let connection = engine.connection();
        let color = match connection {
            ConnectionState::Connected => PLOT_CONFIG.color_profit,
            ConnectionState::Failed => PLOT_CONFIG.color_loss,
            ConnectionState::Offline => PLOT_CONFIG.color_text_subdued,
            _ => Color32::YELLOW,
        };
        ui.label(RichText::new(format!("● {}", connection.label())).small().color(color));
        if let ConnectionState::Reconnecting(Some(reason)) = connection {
            ui.label_subdued(reason.clone());
        }
        if *connection == ConnectionState::Failed && ui.small_button("Reconnect").clicked() {
            action = Some(HeaderAction::Reconnect);
        }
        if let LoadState::Failed(error) = engine.load_state() {
            ui.label(RichText::new(error).small().color(PLOT_CONFIG.color_loss));
            if ui.small_button("Retry").clicked() {
                action = Some(HeaderAction::Reload);
            }
        }
    });
    action
}

pub(crate) fn render_status_bar(ui: &mut Ui, engine: &ChartEngine) {
    ui.horizontal(|ui| {
        let state = match engine.load_state() {
            LoadState::Idle => "Idle",
            LoadState::Loading => "Loading...",
            LoadState::Ready => "Ready",
            LoadState::Failed(_) => "Fetch failed",
        };
        ui.label_subdued(state);
        ui.separator();
        ui.label_subdued(format!("{} candles", engine.series().len()));
        if let (Some(first), Some(last)) = (
            engine.series().candles().first(),
            engine.series().last(),
        ) {
            ui.label_subdued(format!(
                "{} .. {}",
                epoch_ms_to_utc(first.timestamp_ms),
                epoch_ms_to_utc(last.timestamp_ms)
            ));
        }
        if let Some(at) = engine.last_update_ms() {
            let age = (local_now_as_timestamp_ms() - at).max(0);
            ui.label_subdued(format!("updated {} ago", format_duration(age)));
        }

        let index = engine.viewport().index_domain();
        ui.label_subdued(format!("view {:.1} .. {:.1}", index.start, index.end));

        let zone_count: usize = engine
            .patterns()
            .enabled_timeframes()
            .into_iter()
            .map(|tf| engine.patterns().zones(tf).len())
            .sum();
        ui.separator();
        ui.label_subdued(format!("{} zones", zone_count));
        ui.label_subdued(format!("gesture {:?}", engine.gesture_state()));
    });
}
