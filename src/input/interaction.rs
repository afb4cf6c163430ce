/// Pixel position inside the plot area (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPos {
    pub x: f64,
    pub y: f64,
}

impl ScreenPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &ScreenPos) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrosshairSource {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crosshair {
    pub pos: ScreenPos,
    pub source: CrosshairSource,
}

/// Transient state shared by the mouse, touch and hover handlers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InteractionState {
    pub crosshair: Option<Crosshair>,
    /// A finger is actively driving the crosshair (long-press mode).
    pub is_crosshair_active: bool,
    /// A pan, pinch or axis drag is in progress. Suppresses hover tooltips.
    pub is_dragging: bool,
}

impl InteractionState {
    pub fn set_crosshair(&mut self, pos: ScreenPos, source: CrosshairSource) {
        self.crosshair = Some(Crosshair { pos, source });
    }

    /// Remove the crosshair only if `source` owns it.
    pub fn clear_crosshair(&mut self, source: CrosshairSource) {
        if self.crosshair.is_some_and(|c| c.source == source) {
            self.crosshair = None;
        }
    }
}
