use {
    super::{
        interaction::{CrosshairSource, InteractionState, ScreenPos},
        mouse::apply_drag,
        throttle::FrameThrottle,
    },
    crate::{chart::Viewport, config::GESTURES, utils::AppInstant},
};

#[cfg(debug_assertions)]
use crate::config::DF;

/// Touch gesture classifier.
///
/// `Idle -> Pending -> (Panning | Crosshair) -> Idle`, and `Idle -> Pinching -> Idle`
/// whenever a second finger lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    /// One finger down, waiting to see if it moves or holds.
    Pending,
    Panning,
    Crosshair,
    Pinching,
}

/// Touch state machine driven by explicit timestamps.
///
/// Timers are plain deadlines; the host calls [`Self::tick`] with the current time
/// (and [`Self::next_deadline`] tells it when to wake up). Lifting every finger
/// always returns to `Idle` with the long-press timer and pending frames cleared.
#[derive(Debug, Default)]
pub struct TouchGestures {
    state: GestureState,
    long_press_at: Option<AppInstant>,
    linger_until: Option<AppInstant>,
    touch_start: ScreenPos,
    last_pan: ScreenPos,
    pinch_distance: f64,
    pending_pan: FrameThrottle<ScreenPos>,
    pending_pinch: FrameThrottle<f64>,
}

impl TouchGestures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Earliest pending timer, if any.
    pub fn next_deadline(&self) -> Option<AppInstant> {
        match (self.long_press_at, self.linger_until) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn transition(&mut self, next: GestureState) {
        #[cfg(debug_assertions)]
        if DF.log_gestures && self.state != next {
            log::info!("[touch] {:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }

    /// Fingers currently down after a touch started.
    pub fn touch_start(&mut self, touches: &[ScreenPos], now: AppInstant, ui: &mut InteractionState) {
        // A new touch dismisses a lingering crosshair immediately.
        if self.linger_until.take().is_some() {
            ui.clear_crosshair(CrosshairSource::Touch);
        }

        match touches {
            [first, second, ..] => {
                self.long_press_at = None;
                self.pending_pan.cancel();
                if self.state == GestureState::Crosshair {
                    ui.is_crosshair_active = false;
                    ui.clear_crosshair(CrosshairSource::Touch);
                }
                self.pinch_distance = first.distance(second);
                ui.is_dragging = true;
                self.transition(GestureState::Pinching);
            }
            [only] => {
                self.touch_start = *only;
                self.last_pan = *only;
                self.long_press_at = Some(now + GESTURES.long_press);
                self.transition(GestureState::Pending);
            }
            [] => {}
        }
    }

    /// Fingers moved. Returns `true` if a frame should be scheduled.
    pub fn touch_move(&mut self, touches: &[ScreenPos], ui: &mut InteractionState) -> bool {
        match (self.state, touches) {
            (GestureState::Pending, [pos]) => {
                if pos.distance(&self.touch_start) > GESTURES.pan_threshold_px {
                    self.long_press_at = None;
                    ui.is_dragging = true;
                    self.transition(GestureState::Panning);
                }
                false
            }
            (GestureState::Panning, [pos, ..]) => self.pending_pan.submit(*pos),
            (GestureState::Crosshair, [pos, ..]) => {
                ui.set_crosshair(*pos, CrosshairSource::Touch);
                false
            }
            (GestureState::Pinching, [first, second]) => {
                self.pending_pinch.submit(first.distance(second))
            }
            _ => false,
        }
    }

    /// A finger lifted. Every state returns to `Idle`.
    pub fn touch_end(&mut self, now: AppInstant, ui: &mut InteractionState) {
        match self.state {
            GestureState::Pending => self.long_press_at = None,
            GestureState::Panning | GestureState::Pinching => ui.is_dragging = false,
            GestureState::Crosshair => {
                ui.is_crosshair_active = false;
                self.linger_until = Some(now + GESTURES.crosshair_linger);
            }
            GestureState::Idle => {}
        }
        self.long_press_at = None;
        self.pending_pan.cancel();
        self.pending_pinch.cancel();
        self.transition(GestureState::Idle);
    }

    /// Drop everything: timers, pending frames and any touch-owned crosshair.
    pub fn cancel(&mut self, ui: &mut InteractionState) {
        if matches!(self.state, GestureState::Panning | GestureState::Pinching) {
            ui.is_dragging = false;
        }
        if self.state == GestureState::Crosshair || self.linger_until.is_some() {
            ui.is_crosshair_active = false;
            ui.clear_crosshair(CrosshairSource::Touch);
        }
        self.long_press_at = None;
        self.linger_until = None;
        self.pending_pan.cancel();
        self.pending_pinch.cancel();
        self.transition(GestureState::Idle);
    }

    /// Fire timers that are due at `now`. Returns whether anything visible changed.
    pub fn tick(&mut self, now: AppInstant, ui: &mut InteractionState) -> bool {
        let mut changed = false;

        if let Some(at) = self.long_press_at
            && now >= at
        {
            self.long_press_at = None;
            if self.state == GestureState::Pending {
                ui.is_crosshair_active = true;
                ui.set_crosshair(self.touch_start, CrosshairSource::Touch);
                self.transition(GestureState::Crosshair);
                changed = true;
            }
        }

        if let Some(until) = self.linger_until
            && now >= until
        {
            self.linger_until = None;
            ui.clear_crosshair(CrosshairSource::Touch);
            changed = true;
        }
        changed
    }

    /// Apply the pan or pinch captured since the last frame.
    pub fn on_frame(&mut self, viewport: &mut Viewport) -> bool {
        let mut changed = false;

        if let Some(pos) = self.pending_pan.take()
            && self.state == GestureState::Panning
        {
            changed |= apply_drag(viewport, pos.x - self.last_pan.x, pos.y - self.last_pan.y);
            self.last_pan = pos;
        }

        if let Some(distance) = self.pending_pinch.take()
            && self.state == GestureState::Pinching
            && distance > 0.0
            && self.pinch_distance > 0.0
        {
            // fingers closing (> 1) zooms out, spreading zooms in
            let factor = (self.pinch_distance / distance)
                .clamp(GESTURES.pinch_min_factor, GESTURES.pinch_max_factor);
            changed |= viewport.zoom_x(factor);
            self.pinch_distance = distance;
        }
        changed
    }
}
