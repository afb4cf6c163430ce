use {
    super::interaction::ScreenPos,
    crate::{
        chart::{ChartRange, IndexDomain, pixel_to_index},
        config::GESTURES,
        domain::Candle,
        utils::AppInstant,
    },
};

/// Candle details shown next to the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tooltip {
    pub index: usize,
    pub candle: Candle,
    /// Previous candle, for change-vs-previous figures.
    pub prev: Option<Candle>,
    /// Top-left corner of the tooltip box.
    pub pos: ScreenPos,
}

/// Tooltip box placement: above-right of the pointer, flipped left or below
/// when it would leave the chart, and kept above the bottom edge.
pub fn tooltip_position(pointer: ScreenPos, range: &ChartRange) -> ScreenPos {
    let (w, h, offset) = (
        GESTURES.tooltip_width,
        GESTURES.tooltip_height,
        GESTURES.tooltip_offset,
    );
    let mut x = pointer.x + offset;
    let mut y = pointer.y - h - offset;

    if x + w > range.width {
        x = pointer.x - w - offset;
    }
    if y < 0.0 {
        y = pointer.y + offset;
    }
    if y + h > range.height {
        y = range.height - h - offset;
    }
    ScreenPos::new(x, y)
}

#[derive(Debug, Clone, Copy)]
struct Hovered {
    index: usize,
    pos: ScreenPos,
}

/// Delayed candle tooltip.
///
/// Appears after the pointer dwells on one candle for `hover_delay`; any move to
/// another candle restarts the wait. Touch shows it after the same dwell and keeps
/// it for `touch_tooltip_linger` after lift-off.
#[derive(Debug, Default)]
pub struct HoverTracker {
    current_index: Option<usize>,
    pending: Option<(AppInstant, Hovered)>,
    hide_at: Option<AppInstant>,
    visible: Option<Hovered>,
}

fn candle_index_at(x: f64, domain: &IndexDomain, range: &ChartRange, len: usize) -> Option<usize> {
    let index = pixel_to_index(x, domain, range).floor();
    if !index.is_finite() || index < 0.0 || index >= len as f64 {
        return None;
    }
    Some(index as usize)
}

impl HoverTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible.is_some()
    }

    pub fn next_deadline(&self) -> Option<AppInstant> {
        match (self.pending.map(|(at, _)| at), self.hide_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn hide(&mut self) {
        self.current_index = None;
        self.pending = None;
        self.hide_at = None;
        self.visible = None;
    }

    fn clear_timers(&mut self) {
        self.pending = None;
        self.hide_at = None;
    }

    pub fn pointer_move(
        &mut self,
        pos: ScreenPos,
        now: AppInstant,
        domain: &IndexDomain,
        range: &ChartRange,
        len: usize,
        is_dragging: bool,
    ) {
        if is_dragging {
            self.hide();
            return;
        }
        let Some(index) = candle_index_at(pos.x, domain, range, len) else {
            self.hide();
            return;
        };

        if self.current_index != Some(index) {
            self.clear_timers();
            self.visible = None;
            self.current_index = Some(index);
            self.pending = Some((now + GESTURES.hover_delay, Hovered { index, pos }));
        } else if let Some(visible) = self.visible.as_mut() {
            visible.pos = pos;
        }
    }

    pub fn pointer_leave(&mut self) {
        self.hide();
    }

    pub fn touch_start(
        &mut self,
        pos: ScreenPos,
        now: AppInstant,
        domain: &IndexDomain,
        range: &ChartRange,
        len: usize,
        is_dragging: bool,
    ) {
        if is_dragging {
            return;
        }
        let Some(index) = candle_index_at(pos.x, domain, range, len) else {
            return;
        };
        self.current_index = Some(index);
        self.clear_timers();
        self.pending = Some((now + GESTURES.hover_delay, Hovered { index, pos }));
    }

    /// A moving finger is a drag, not a hover.
    pub fn touch_move(&mut self) {
        self.clear_timers();
        if self.visible.is_some() {
            self.hide();
        }
    }

    pub fn touch_end(&mut self, now: AppInstant) {
        self.clear_timers();
        if self.visible.is_some() {
            self.hide_at = Some(now + GESTURES.touch_tooltip_linger);
        }
    }

    /// Fire due timers. Returns whether visibility changed.
    pub fn tick(&mut self, now: AppInstant) -> bool {
        let mut changed = false;
        if let Some((at, hovered)) = self.pending
            && now >= at
        {
            self.pending = None;
            self.visible = Some(hovered);
            changed = true;
        }
        if let Some(at) = self.hide_at
            && now >= at
        {
            self.hide();
            changed = true;
        }
        changed
    }

    /// Tooltip to draw, if any. Hidden while dragging or when the candle scrolled away.
    pub fn tooltip(&self, candles: &[Candle], range: &ChartRange, is_dragging: bool) -> Option<Tooltip> {
        if is_dragging {
            return None;
        }
        let hovered = self.visible?;
        let candle = *candles.get(hovered.index)?;
        let prev = hovered
            .index
            .checked_sub(1)
            .and_then(|i| candles.get(i))
            .copied();
        Some(Tooltip {
            index: hovered.index,
            candle,
            prev,
            pos: tooltip_position(hovered.pos, range),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn candles() -> Vec<Candle> {
        (0..20)
            .map(|i| Candle::new(1 + i, 1.0, 2.0, 0.5, 1.5, i as f64))
            .collect()
    }

    // 20 candles over 400px: 20px per candle
    fn frame() -> (IndexDomain, ChartRange) {
        (IndexDomain::new(0.0, 20.0), ChartRange::new(400.0, 300.0))
    }

    #[test]
    fn tooltip_appears_after_dwell() {
        let (domain, range) = frame();
        let data = candles();
        let mut hover = HoverTracker::new();
        let t0 = AppInstant::now();

        hover.pointer_move(ScreenPos::new(105.0, 200.0), t0, &domain, &range, 20, false);
        assert!(!hover.tick(t0 + ms(499)));
        assert!(hover.tooltip(&data, &range, false).is_none());

        assert!(hover.tick(t0 + ms(500)));
        let tooltip = hover.tooltip(&data, &range, false).unwrap();
        assert_eq!(tooltip.index, 5);
        assert_eq!(tooltip.prev.map(|c| c.volume), Some(4.0));
        assert!(hover.tooltip(&data, &range, true).is_none());
    }

    #[test]
    fn moving_to_another_candle_restarts_the_wait() {
        let (domain, range) = frame();
        let mut hover = HoverTracker::new();
        let t0 = AppInstant::now();

        hover.pointer_move(ScreenPos::new(105.0, 200.0), t0, &domain, &range, 20, false);
        hover.pointer_move(ScreenPos::new(131.0, 200.0), t0 + ms(300), &domain, &range, 20, false);
        assert!(!hover.tick(t0 + ms(600)));
        assert!(hover.tick(t0 + ms(800)));
        assert!(hover.is_visible());
    }

    #[test]
    fn dragging_or_leaving_hides_tooltip() {
        let (domain, range) = frame();
        let mut hover = HoverTracker::new();
        let t0 = AppInstant::now();

        hover.pointer_move(ScreenPos::new(105.0, 200.0), t0, &domain, &range, 20, false);
        hover.tick(t0 + ms(500));
        hover.pointer_move(ScreenPos::new(106.0, 200.0), t0 + ms(510), &domain, &range, 20, true);
        assert!(!hover.is_visible());
        assert!(hover.next_deadline().is_none());

        hover.pointer_move(ScreenPos::new(105.0, 200.0), t0, &domain, &range, 20, false);
        hover.pointer_leave();
        assert!(!hover.tick(t0 + ms(1_000)));
    }

    #[test]
    fn pointer_past_last_candle_shows_nothing() {
        let (_, range) = frame();
        let domain = IndexDomain::new(10.0, 30.0);
        let mut hover = HoverTracker::new();
        let t0 = AppInstant::now();
        hover.pointer_move(ScreenPos::new(350.0, 10.0), t0, &domain, &range, 20, false);
        assert!(hover.next_deadline().is_none());
    }

    #[test]
    fn touch_tooltip_lingers_after_lift() {
        let (domain, range) = frame();
        let mut hover = HoverTracker::new();
        let t0 = AppInstant::now();

        hover.touch_start(ScreenPos::new(45.0, 100.0), t0, &domain, &range, 20, false);
        hover.tick(t0 + ms(500));
        assert!(hover.is_visible());

        hover.touch_end(t0 + ms(700));
        assert!(!hover.tick(t0 + ms(2_699)));
        assert!(hover.is_visible());
        assert!(hover.tick(t0 + ms(2_700)));
        assert!(!hover.is_visible());
    }

    #[test]
    fn placement_flips_at_edges() {
        let range = ChartRange::new(400.0, 300.0);
        // room above-right
        assert_eq!(
            tooltip_position(ScreenPos::new(50.0, 250.0), &range),
            ScreenPos::new(60.0, 60.0)
        );
        // right edge: flip left; top edge: flip below
        assert_eq!(
            tooltip_position(ScreenPos::new(380.0, 20.0), &range),
            ScreenPos::new(210.0, 30.0)
        );
        // below would overflow the bottom
        assert_eq!(
            tooltip_position(ScreenPos::new(50.0, 150.0), &range),
            ScreenPos::new(60.0, 110.0)
        );
    }
}
