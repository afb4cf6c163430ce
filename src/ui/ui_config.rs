use eframe::egui::{Color32, Frame, Margin, Stroke};

/// UI Colors for consistent theming
#[derive(Clone, Copy, Default)]
pub struct UiColors {
    pub label: Color32,
    pub heading: Color32,
    pub central_panel: Color32,
    pub side_panel: Color32,
    pub tooltip_fill: Color32,
    pub tooltip_border: Color32,
}

/// Main UI configuration struct that holds all UI-related settings
#[derive(Default, Clone, Copy)]
pub struct UiConfig {
    pub colors: UiColors,
    /// Poll interval for background data while idle (ms).
    pub repaint_poll_ms: u64,
}

/// Global UI configuration instance
pub static UI_CONFIG: UiConfig = UiConfig {
    colors: UiColors {
        label: Color32::GRAY,
        heading: Color32::YELLOW,
        central_panel: Color32::from_rgb(17, 24, 39),
        side_panel: Color32::from_rgb(25, 25, 25),
        tooltip_fill: Color32::from_rgba_premultiplied(20, 20, 28, 235),
        tooltip_border: Color32::from_gray(90),
    },
    repaint_poll_ms: 100,
};

impl UiConfig {
    /// Frame for the Top Toolbar (Standard padding)
    pub fn top_panel_frame(&self) -> Frame {
        Frame {
            fill: self.colors.side_panel,
            stroke: Stroke::NONE,
            inner_margin: Margin::same(8),
            ..Default::default()
        }
    }

    /// Frame for Bottom Status bar (Tighter vertical padding)
    pub fn bottom_panel_frame(&self) -> Frame {
        Frame {
            fill: self.colors.side_panel,
            stroke: Stroke::NONE,
            inner_margin: Margin::symmetric(8, 4),
            ..Default::default()
        }
    }

    // Frame for the Plot area
    pub fn central_panel_frame(&self) -> Frame {
        Frame {
            fill: self.colors.central_panel,
            stroke: Stroke::NONE,
            inner_margin: Margin::same(0),
            ..Default::default()
        }
    }
}
