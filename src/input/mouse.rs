use {
    super::{
        interaction::{CrosshairSource, InteractionState, ScreenPos},
        throttle::{FrameThrottle, IntervalGate},
    },
    crate::{chart::Viewport, config::GESTURES, utils::AppInstant},
};

#[cfg(debug_assertions)]
use crate::config::DF;

/// Translate a pointer movement of `(dx, dy)` pixels into a time pan and a price pan.
/// Dragging right reveals older candles; dragging down raises the visible prices.
/// Each axis ignores movement within the dead zone. Returns whether anything moved.
pub(crate) fn apply_drag(viewport: &mut Viewport, dx: f64, dy: f64) -> bool {
    let range = viewport.range();
    let mut moved = false;

    if dx.abs() > GESTURES.drag_dead_zone_px {
        let index_per_pixel = viewport.index_domain().width() / range.width;
        moved |= viewport.pan_x(-dx * index_per_pixel);
    }
    if dy.abs() > GESTURES.drag_dead_zone_px {
        let price_per_pixel = viewport.price_domain().range() / range.height;
        moved |= viewport.pan_y(dy * price_per_pixel);
    }
    moved
}

/// Axis strips that zoom when dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisDrag {
    /// Horizontal drag on the time axis zooms the index window.
    Time,
    /// Vertical drag on the price axis zooms the price window.
    Price,
}

#[derive(Debug, Clone, Copy)]
struct AxisDragState {
    axis: AxisDrag,
    last: f64,
}

/// Mouse drag-to-pan, wheel zoom, hover crosshair and axis drag-zoom.
///
/// Moves are buffered in a [`FrameThrottle`]; the host calls [`Self::on_frame`]
/// once per rendered frame to apply them.
#[derive(Debug)]
pub struct MouseController {
    drag_anchor: Option<ScreenPos>,
    pending_move: FrameThrottle<ScreenPos>,
    axis_drag: Option<AxisDragState>,
    pending_axis: FrameThrottle<f64>,
    wheel_gate: IntervalGate,
}

impl Default for MouseController {
    fn default() -> Self {
        Self {
            drag_anchor: None,
            pending_move: FrameThrottle::new(),
            axis_drag: None,
            pending_axis: FrameThrottle::new(),
            wheel_gate: IntervalGate::new(GESTURES.wheel_min_interval),
        }
    }
}

impl MouseController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some() || self.axis_drag.is_some()
    }

    /// Button pressed inside the plot: start a pan.
    pub fn press(&mut self, pos: ScreenPos, ui: &mut InteractionState) {
        self.drag_anchor = Some(pos);
        self.pending_move.cancel();
        ui.is_dragging = true;
    }

    /// Button pressed on an axis strip: start a drag-zoom along that axis.
    pub fn press_axis(&mut self, axis: AxisDrag, pos: ScreenPos, ui: &mut InteractionState) {
        let last = match axis {
            AxisDrag::Time => pos.x,
            AxisDrag::Price => pos.y,
        };
        self.axis_drag = Some(AxisDragState { axis, last });
        self.pending_axis.cancel();
        ui.is_dragging = true;
    }

    /// Pointer moved (anywhere on the window while a drag is held).
    /// Returns `true` if a frame should be scheduled.
    pub fn move_to(&mut self, pos: ScreenPos, ui: &mut InteractionState) -> bool {
        if let Some(state) = self.axis_drag {
            let coord = match state.axis {
                AxisDrag::Time => pos.x,
                AxisDrag::Price => pos.y,
            };
            return self.pending_axis.submit(coord);
        }
        if self.drag_anchor.is_some() {
            return self.pending_move.submit(pos);
        }
        ui.set_crosshair(pos, CrosshairSource::Mouse);
        false
    }

    /// Button released anywhere: end whichever drag is active.
    pub fn release(&mut self, ui: &mut InteractionState) {
        self.drag_anchor = None;
        self.axis_drag = None;
        self.pending_move.cancel();
        self.pending_axis.cancel();
        ui.is_dragging = false;
    }

    /// Pointer left the plot area.
    pub fn leave(&mut self, ui: &mut InteractionState) {
        ui.clear_crosshair(CrosshairSource::Mouse);
    }

    /// Wheel zoom about the window center; positive `delta_y` (scroll down) zooms out.
    /// Events closer together than the wheel interval are dropped.
    pub fn wheel(&mut self, delta_y: f64, now: AppInstant, viewport: &mut Viewport) -> bool {
        if delta_y == 0.0 || !self.wheel_gate.admit(now) {
            return false;
        }
        let factor = if delta_y > 0.0 {
            GESTURES.wheel_zoom_out
        } else {
            GESTURES.wheel_zoom_in
        };
        viewport.zoom_x(factor)
    }

    /// Apply the move captured since the last frame. Returns whether the viewport changed.
    pub fn on_frame(&mut self, viewport: &mut Viewport) -> bool {
        let mut changed = false;

        if let (Some(anchor), Some(pos)) = (self.drag_anchor, self.pending_move.take()) {
            changed |= apply_drag(viewport, pos.x - anchor.x, pos.y - anchor.y);
            self.drag_anchor = Some(pos);
        }

        if let Some(state) = self.axis_drag
            && let Some(coord) = self.pending_axis.take()
        {
            let factor = 1.0 + (coord - state.last) * GESTURES.axis_zoom_sensitivity;
            changed |= match state.axis {
                AxisDrag::Time => viewport.zoom_x(factor),
                AxisDrag::Price => viewport.zoom_y(factor),
            };
            self.axis_drag = Some(AxisDragState {
                last: coord,
                ..state
            });
        }

        #[cfg(debug_assertions)]
        if DF.log_gestures && changed {
            log::info!("[mouse] frame applied: {:?}", viewport.index_domain());
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Candle;
    use std::time::Duration;

    fn viewport() -> Viewport {
        let candles: Vec<Candle> = (0..200)
            .map(|i| Candle::new(1 + i, 100.0, 110.0, 90.0, 105.0, 1.0))
            .collect();
        let mut viewport = Viewport::default();
        viewport.initialize(&candles, 540.0, 400.0);
        viewport
    }

    #[test]
    fn drag_right_pans_back_in_time() {
        let mut vp = viewport();
        let mut ui = InteractionState::default();
        let mut mouse = MouseController::new();
        let before = vp.index_domain();

        mouse.press(ScreenPos::new(300.0, 200.0), &mut ui);
        assert!(ui.is_dragging);
        assert!(mouse.move_to(ScreenPos::new(340.0, 200.0), &mut ui));
        // second move in the same frame does not schedule another frame
        assert!(!mouse.move_to(ScreenPos::new(350.0, 200.0), &mut ui));
        assert!(mouse.on_frame(&mut vp));

        // 54 indices over 540px: 0.1 index per pixel, 50px -> 5 indices
        let after = vp.index_domain();
        assert!((after.start - (before.start - 5.0)).abs() < 1e-9);
        assert_eq!(vp.price_domain(), viewport().price_domain());

        mouse.release(&mut ui);
        assert!(!ui.is_dragging);
        assert!(!mouse.on_frame(&mut vp));
    }

    #[test]
    fn jitter_inside_dead_zone_is_ignored() {
        let mut vp = viewport();
        let mut ui = InteractionState::default();
        let mut mouse = MouseController::new();
        mouse.press(ScreenPos::new(10.0, 10.0), &mut ui);
        mouse.move_to(ScreenPos::new(11.0, 9.0), &mut ui);
        assert!(!mouse.on_frame(&mut vp));
    }

    #[test]
    fn vertical_drag_pans_price() {
        let mut vp = viewport();
        let mut ui = InteractionState::default();
        let mut mouse = MouseController::new();
        let before = vp.price_domain();

        mouse.press(ScreenPos::new(10.0, 100.0), &mut ui);
        mouse.move_to(ScreenPos::new(10.0, 140.0), &mut ui);
        mouse.on_frame(&mut vp);
        let shift = 40.0 * before.range() / 400.0;
        assert!((vp.price_domain().min - (before.min + shift)).abs() < 1e-9);
    }

    #[test]
    fn hover_sets_mouse_crosshair_and_leave_clears_it() {
        let mut ui = InteractionState::default();
        let mut mouse = MouseController::new();
        assert!(!mouse.move_to(ScreenPos::new(5.0, 6.0), &mut ui));
        assert_eq!(ui.crosshair.map(|c| c.source), Some(CrosshairSource::Mouse));
        mouse.leave(&mut ui);
        assert!(ui.crosshair.is_none());
    }

    #[test]
    fn wheel_is_time_throttled() {
        let mut vp = viewport();
        let mut mouse = MouseController::new();
        let t0 = AppInstant::now();
        let width = vp.index_domain().width();

        assert!(mouse.wheel(120.0, t0, &mut vp));
        assert!((vp.index_domain().width() - width * 1.1).abs() < 1e-9);
        assert!(!mouse.wheel(120.0, t0 + Duration::from_millis(8), &mut vp));
        assert!(mouse.wheel(-120.0, t0 + Duration::from_millis(20), &mut vp));
        assert!((vp.index_domain().width() - width * 1.1 * 0.9).abs() < 1e-9);
    }

    #[test]
    fn axis_drag_zooms_along_its_axis() {
        let mut vp = viewport();
        let mut ui = InteractionState::default();
        let mut mouse = MouseController::new();
        let width = vp.index_domain().width();
        let price_range = vp.price_domain().range();

        mouse.press_axis(AxisDrag::Time, ScreenPos::new(100.0, 0.0), &mut ui);
        mouse.move_to(ScreenPos::new(120.0, 50.0), &mut ui);
        assert!(mouse.on_frame(&mut vp));
        assert!((vp.index_domain().width() - width * 1.2).abs() < 1e-9);
        assert_eq!(vp.price_domain().range(), price_range);
        mouse.release(&mut ui);

        mouse.press_axis(AxisDrag::Price, ScreenPos::new(0.0, 100.0), &mut ui);
        mouse.move_to(ScreenPos::new(0.0, 90.0), &mut ui);
        mouse.on_frame(&mut vp);
        assert!((vp.price_domain().range() - price_range * 0.9).abs() < 1e-9);
    }
}
