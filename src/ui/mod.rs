mod app;
mod painter;
mod panels;
mod styles;
mod ui_config;

pub use app::App;

pub(crate) use styles::{DirectionColor, UiStyleExt, apply_opacity, get_outcome_color};
pub(crate) use ui_config::UI_CONFIG;
