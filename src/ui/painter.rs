use eframe::egui::{
    Align2, Color32, CornerRadius, FontId, Painter, Pos2, Rect, Stroke, StrokeKind, Vec2,
};

use crate::{
    analysis::{DisplayZone, ZoneKind},
    chart::{format_price, index_to_pixel, price_to_pixel},
    config::{GESTURES, PLOT_CONFIG},
    engine::{PriceMarker, RenderFrame, RenderedCandle},
    input::Tooltip,
    ui::{DirectionColor, UI_CONFIG, apply_opacity, get_outcome_color},
    utils::epoch_ms_to_utc_datetime,
};

/// Screen rectangles for the plot and its two axis strips.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChartLayout {
    pub plot: Rect,
    pub price_axis: Rect,
    pub time_axis: Rect,
}

impl ChartLayout {
    pub fn split(outer: Rect) -> Self {
        let axis_w = PLOT_CONFIG.price_axis_width;
        let axis_h = PLOT_CONFIG.time_axis_height;
        let plot = Rect::from_min_max(
            outer.min,
            Pos2::new(outer.max.x - axis_w, outer.max.y - axis_h),
        );
        Self {
            plot,
            price_axis: Rect::from_min_max(
                Pos2::new(plot.max.x, outer.min.y),
                Pos2::new(outer.max.x, plot.max.y),
            ),
            time_axis: Rect::from_min_max(
                Pos2::new(outer.min.x, plot.max.y),
                Pos2::new(plot.max.x, outer.max.y),
            ),
        }
    }

    fn at(&self, x: f64, y: f64) -> Pos2 {
        self.plot.min + Vec2::new(x as f32, y as f32)
    }
}

fn small_font() -> FontId {
    FontId::monospace(11.0)
}

pub(crate) fn paint_chart(painter: &Painter, layout: &ChartLayout, frame: &RenderFrame) {
    let plot_painter = painter.with_clip_rect(layout.plot);
    plot_painter.rect_filled(layout.plot, CornerRadius::ZERO, PLOT_CONFIG.background_color);

    paint_grid(&plot_painter, layout, frame);
    for zone in &frame.zones {
        paint_zone(&plot_painter, layout, frame, zone);
    }
    for candle in &frame.candles {
        paint_candle(&plot_painter, layout, candle);
    }
    paint_extremes(&plot_painter, layout, frame);
    paint_current_price(painter, layout, frame);
    paint_axes(painter, layout, frame);
    paint_crosshair(painter, layout, frame);

    if let Some(tooltip) = &frame.tooltip {
        paint_tooltip(painter, layout, tooltip);
    }
}

fn paint_grid(painter: &Painter, layout: &ChartLayout, frame: &RenderFrame) {
    let stroke = Stroke::new(1.0, PLOT_CONFIG.grid_color);
    for &price in &frame.price_labels.labels {
        let y = price_to_pixel(price, &frame.domain.price, &frame.range);
        painter.hline(layout.plot.x_range(), layout.at(0.0, y).y, stroke);
    }
    for label in &frame.time_labels {
        painter.vline(layout.at(label.x, 0.0).x, layout.plot.y_range(), stroke);
    }
}

fn paint_zone(painter: &Painter, layout: &ChartLayout, frame: &RenderFrame, display: &DisplayZone) {
    let zone = &display.zone;
    let x0 = index_to_pixel(
        display.chart_start_index as f64,
        &frame.domain.index,
        &frame.range,
    );
    let x1 = display
        .chart_end_index
        .map(|end| index_to_pixel(end as f64 + 1.0, &frame.domain.index, &frame.range))
        .unwrap_or(frame.range.width);
    let top = price_to_pixel(zone.zone_top, &frame.domain.price, &frame.range);
    let bottom = price_to_pixel(zone.zone_bottom, &frame.domain.price, &frame.range);
    if x1 <= 0.0 || x0 >= frame.range.width {
        return;
    }

    let color = PLOT_CONFIG.zone_color(zone.timeframe);
    let rect = Rect::from_two_pos(layout.at(x0, top), layout.at(x1, bottom));
    painter.rect_filled(
        rect,
        CornerRadius::ZERO,
        apply_opacity(color, PLOT_CONFIG.zone_fill_opacity_pct),
    );
    let edge = Stroke::new(PLOT_CONFIG.zone_boundary_line_width, color);
    // the edge price traders watch: bottom of a bullish zone, top of a bearish one
    let edge_y = match zone.kind {
        ZoneKind::Bullish => rect.max.y,
        ZoneKind::Bearish => rect.min.y,
    };
    painter.hline(rect.x_range(), edge_y, edge);
    painter.text(
        rect.left_top() + Vec2::new(2.0, 1.0),
        Align2::LEFT_TOP,
        zone.timeframe.to_string(),
        FontId::proportional(9.0),
        color,
    );
}

fn paint_candle(painter: &Painter, layout: &ChartLayout, rendered: &RenderedCandle) {
    let g = &rendered.geometry;
    let color = rendered.candle.direction().color();
    let center_x = g.x + g.candle_width / 2.0;

    painter.line_segment(
        [layout.at(center_x, g.high_y), layout.at(center_x, g.low_y)],
        Stroke::new(PLOT_CONFIG.candle_wick_width, color),
    );

    let body_w = g.candle_width * PLOT_CONFIG.candle_width_pct as f64;
    let body_x = center_x - body_w / 2.0;
    let body = Rect::from_min_size(
        layout.at(body_x, g.body_y),
        Vec2::new(body_w as f32, g.body_height as f32),
    );
    painter.rect_filled(body, CornerRadius::ZERO, color);
}

/// Horizontal run from the marker's candle to the plot's right edge, in screen space.
/// `None` when the candle is off to the right or the price is outside the plot.
fn extreme_marker_line(layout: &ChartLayout, frame: &RenderFrame, marker: &PriceMarker) -> Option<[Pos2; 2]> {
    let x = index_to_pixel(marker.index as f64 + 0.5, &frame.domain.index, &frame.range);
    let y = price_to_pixel(marker.price, &frame.domain.price, &frame.range);
    let start = layout.at(x.max(0.0), y);
    if start.x >= layout.plot.max.x || !layout.plot.y_range().contains(start.y) {
        return None;
    }
    Some([start, Pos2::new(layout.plot.max.x, start.y)])
}

fn paint_extremes(painter: &Painter, layout: &ChartLayout, frame: &RenderFrame) {
    let color = PLOT_CONFIG.extreme_marker_color;
    let markers = [
        (frame.visible_high, Align2::LEFT_BOTTOM),
        (frame.visible_low, Align2::LEFT_TOP),
    ];
    for (marker, anchor) in markers {
        let Some(marker) = marker else {
            continue;
        };
        let Some([start, end]) = extreme_marker_line(layout, frame, &marker) else {
            continue;
        };
        painter.line_segment([start, end], Stroke::new(1.0, color));
        painter.text(
            start + Vec2::new(4.0, 0.0),
            anchor,
            format_price(marker.price, frame.price_labels.step),
            small_font(),
            color,
        );
    }
}

fn paint_current_price(painter: &Painter, layout: &ChartLayout, frame: &RenderFrame) {
    let Some(price) = frame.current_price else {
        return;
    };
    let y = layout
        .at(0.0, price_to_pixel(price, &frame.domain.price, &frame.range))
        .y;
    if !layout.plot.y_range().contains(y) {
        return;
    }
    let color = PLOT_CONFIG.current_price_color;
    painter.hline(
        layout.plot.x_range(),
        y,
        Stroke::new(PLOT_CONFIG.current_price_line_width, color),
    );
    axis_badge(
        painter,
        Pos2::new(layout.price_axis.min.x + 2.0, y),
        &format_price(price, frame.price_labels.step),
        color,
        Color32::BLACK,
    );
}

fn paint_axes(painter: &Painter, layout: &ChartLayout, frame: &RenderFrame) {
    let text_color = PLOT_CONFIG.axis_text_color;
    for &price in &frame.price_labels.labels {
        let y = layout
            .at(0.0, price_to_pixel(price, &frame.domain.price, &frame.range))
            .y;
        if layout.price_axis.y_range().contains(y) {
            painter.text(
                Pos2::new(layout.price_axis.min.x + 6.0, y),
                Align2::LEFT_CENTER,
                format_price(price, frame.price_labels.step),
                small_font(),
                text_color,
            );
        }
    }
    for label in &frame.time_labels {
        let x = layout.at(label.x, 0.0).x;
        if layout.time_axis.x_range().contains(x) {
            painter.text(
                Pos2::new(x, layout.time_axis.min.y + 4.0),
                Align2::CENTER_TOP,
                &label.text,
                small_font(),
                text_color,
            );
        }
    }
}

fn paint_crosshair(painter: &Painter, layout: &ChartLayout, frame: &RenderFrame) {
    let Some(crosshair) = frame.crosshair else {
        return;
    };
    let pos = layout.at(crosshair.pos.x, crosshair.pos.y);
    if !layout.plot.contains(pos) {
        return;
    }
    let stroke = Stroke::new(1.0, PLOT_CONFIG.crosshair_color);
    painter.hline(layout.plot.x_range(), pos.y, stroke);
    painter.vline(pos.x, layout.plot.y_range(), stroke);

    if let Some(price) = frame.crosshair_price {
        axis_badge(
            painter,
            Pos2::new(layout.price_axis.min.x + 2.0, pos.y),
            &format_price(price, frame.price_labels.step),
            PLOT_CONFIG.crosshair_color,
            Color32::BLACK,
        );
    }
}

fn axis_badge(painter: &Painter, left_center: Pos2, text: &str, fill: Color32, text_color: Color32) {
    let galley = painter.layout_no_wrap(text.to_string(), small_font(), text_color);
    let size = galley.size() + Vec2::new(8.0, 4.0);
    let rect = Rect::from_min_size(left_center - Vec2::new(0.0, size.y / 2.0), size);
    painter.rect_filled(rect, CornerRadius::same(2), fill);
    painter.galley(rect.min + Vec2::new(4.0, 2.0), galley, text_color);
}

fn paint_tooltip(painter: &Painter, layout: &ChartLayout, tooltip: &Tooltip) {
    let c = &tooltip.candle;
    let mut lines = vec![
        (epoch_ms_to_utc_datetime(c.timestamp_ms), PLOT_CONFIG.color_text_primary),
        (format!("O {:.2}", c.open_price), PLOT_CONFIG.color_text_subdued),
        (format!("H {:.2}", c.high_price), PLOT_CONFIG.color_text_subdued),
        (format!("L {:.2}", c.low_price), PLOT_CONFIG.color_text_subdued),
        (format!("C {:.2}", c.close_price), PLOT_CONFIG.color_text_primary),
        (format!("V {:.2}", c.volume), PLOT_CONFIG.color_text_subdued),
    ];
    if let Some(prev) = tooltip.prev
        && prev.close_price != 0.0
    {
        let change = c.close_price - prev.close_price;
        let pct = change / prev.close_price * 100.0;
        lines.push((format!("{:+.2} ({:+.2}%)", change, pct), get_outcome_color(change)));
    }

    let origin = layout.at(tooltip.pos.x, tooltip.pos.y);
    let line_h = 14.0;
    let rect = Rect::from_min_size(
        origin,
        Vec2::new(
            GESTURES.tooltip_width as f32,
            lines.len() as f32 * line_h + 8.0,
        ),
    );
    painter.rect(
        rect,
        CornerRadius::same(4),
        UI_CONFIG.colors.tooltip_fill,
        Stroke::new(1.0, UI_CONFIG.colors.tooltip_border),
        StrokeKind::Inside,
    );
    for (i, (text, color)) in lines.into_iter().enumerate() {
        painter.text(
            rect.min + Vec2::new(6.0, 4.0 + i as f32 * line_h),
            Align2::LEFT_TOP,
            text,
            small_font(),
            color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Candle, Interval},
        engine::ChartEngine,
    };

    const HOUR: i64 = 3_600_000;

    fn frame() -> RenderFrame {
        let candles = (0..120)
            .map(|i| {
                let base = 100.0 + i as f64;
                Candle::new(HOUR * (i as i64 + 1), base, base + 2.0, base - 1.0, base + 1.0, 5.0)
            })
            .collect();
        let mut engine = ChartEngine::new("BTCUSDT", Interval::H1);
        engine.start_loading();
        engine.resize(800.0, 400.0);
        engine.apply_snapshot(candles);
        engine.render_frame()
    }

    fn layout() -> ChartLayout {
        let outer = Rect::from_min_size(
            Pos2::new(10.0, 20.0),
            Vec2::new(
                800.0 + PLOT_CONFIG.price_axis_width,
                400.0 + PLOT_CONFIG.time_axis_height,
            ),
        );
        ChartLayout::split(outer)
    }

    #[test]
    fn layout_reserves_axis_strips() {
        let layout = layout();
        assert_eq!(layout.plot.width(), 800.0);
        assert_eq!(layout.plot.height(), 400.0);
        assert_eq!(layout.price_axis.min.x, layout.plot.max.x);
        assert_eq!(layout.time_axis.min.y, layout.plot.max.y);
    }

    #[test]
    fn extreme_lines_run_from_candle_to_right_edge() {
        let (layout, frame) = (layout(), frame());

        let high = frame.visible_high.unwrap();
        let [start, end] = extreme_marker_line(&layout, &frame, &high).unwrap();
        assert_eq!(end.x, layout.plot.max.x);
        assert_eq!(start.y, end.y);
        assert!(start.x > layout.plot.min.x && start.x < end.x);

        let low = frame.visible_low.unwrap();
        let [low_start, _] = extreme_marker_line(&layout, &frame, &low).unwrap();
        // screen y grows downwards
        assert!(low_start.y > start.y);
        assert!(low_start.x < start.x);
    }

    #[test]
    fn extreme_line_skipped_outside_plot() {
        let (layout, frame) = (layout(), frame());
        let far_above = PriceMarker {
            index: 100,
            price: frame.domain.price.max * 2.0,
        };
        assert!(extreme_marker_line(&layout, &frame, &far_above).is_none());

        let far_right = PriceMarker {
            index: 10_000,
            price: frame.domain.price.center(),
        };
        assert!(extreme_marker_line(&layout, &frame, &far_right).is_none());
    }
}
