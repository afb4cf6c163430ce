use {
    crate::{config::PLOT_CONFIG, domain::CandleDirection, ui::UI_CONFIG},
    eframe::egui::{
        Color32, CornerRadius, FontId, Response, RichText, Sense, Stroke, StrokeKind, Ui, Vec2,
        WidgetInfo, WidgetType,
    },
};

pub trait DirectionColor {
    fn color(&self) -> Color32;
}

impl DirectionColor for CandleDirection {
    fn color(&self) -> Color32 {
        match self {
            Self::Bullish | Self::Neutral => PLOT_CONFIG.candle_bullish_color,
            Self::Bearish => PLOT_CONFIG.candle_bearish_color,
        }
    }
}

pub fn apply_opacity(color: Color32, factor: f32) -> Color32 {
    color.linear_multiply(factor)
}

pub fn get_outcome_color(value: f64) -> Color32 {
    if value >= 0.0 {
        PLOT_CONFIG.color_profit
    } else {
        PLOT_CONFIG.color_loss
    }
}

pub(crate) trait UiStyleExt {
    /// Interactive label acting as button: transparent when idle, gray bg on hover, blue bg when selected.
    fn interactive_label(
        &mut self,
        text: &str,
        is_selected: bool,
        idle_color: Color32,
        font_id: FontId,
    ) -> Response;

    fn label_subdued(&mut self, text: impl Into<String>);
    fn metric(&mut self, label: &str, value: &str, color: Color32);
    fn label_heading(&mut self, text: impl Into<String>);
}

impl UiStyleExt for Ui {
    fn interactive_label(
        &mut self,
        text: &str,
        is_selected: bool,
        idle_color: Color32,
        font_id: FontId,
    ) -> Response {
        let padding = Vec2::new(4.0, 4.0);
        let galley = self
            .painter()
            .layout_no_wrap(text.to_string(), font_id, idle_color);
        let desired_size = galley.size() + padding * 2.0;
        let (rect, response) = self.allocate_exact_size(desired_size, Sense::click());
        response.widget_info(|| WidgetInfo::selected(WidgetType::Button, true, is_selected, text));

        if self.is_rect_visible(rect) {
            let visuals = self.style().visuals.clone();
            let (bg_fill, text_color) = if is_selected {
                (visuals.selection.bg_fill, Color32::WHITE)
            } else if response.hovered() || response.has_focus() {
                (visuals.widgets.hovered.bg_fill, Color32::YELLOW)
            } else {
                (Color32::TRANSPARENT, idle_color)
            };

            if is_selected || response.hovered() {
                self.painter().rect(
                    rect,
                    CornerRadius::same(4),
                    bg_fill,
                    Stroke::NONE,
                    StrokeKind::Inside,
                );
            }
            let text_pos = rect.left_top() + padding;
            self.painter().galley(text_pos, galley, text_color);
        }
        response
    }

    fn label_subdued(&mut self, text: impl Into<String>) {
        self.label(RichText::new(text).small().color(UI_CONFIG.colors.label));
    }

    fn metric(&mut self, label: &str, value: &str, color: Color32) {
        self.horizontal(|ui| {
            ui.spacing_mut().item_spacing.x = 2.0; // Tight spacing
            ui.label_subdued(format!("{}:", label));
            ui.label(RichText::new(value).small().color(color));
        });
    }

    fn label_heading(&mut self, text: impl Into<String>) {
        self.label(RichText::new(text).strong().color(UI_CONFIG.colors.heading));
    }
}
