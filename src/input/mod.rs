// Pointer, wheel and touch handling. Nothing here paints; it only mutates the
// viewport and the shared interaction state.
mod hover;
mod interaction;
mod mouse;
mod throttle;
mod touch;

pub use {
    hover::{HoverTracker, Tooltip, tooltip_position},
    interaction::{Crosshair, CrosshairSource, InteractionState, ScreenPos},
    mouse::{AxisDrag, MouseController},
    throttle::{FrameThrottle, IntervalGate},
    touch::{GestureState, TouchGestures},
};
