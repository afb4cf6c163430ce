use {
    super::coords::{ChartDomain, ChartRange, IndexDomain, PriceDomain},
    crate::{config::CHART, domain::Candle},
    itertools::{Itertools, MinMaxResult},
    std::ops::RangeInclusive,
};

/// Real candle indices covered by `domain`: `floor(start)` clamped to 0 through
/// `floor(end)` clamped to the last candle. `None` when nothing real is in view.
pub fn visible_indices(domain: &IndexDomain, len: usize) -> Option<RangeInclusive<usize>> {
    if len == 0 || !domain.start.is_finite() || !domain.end.is_finite() {
        return None;
    }
    let last = (len - 1) as f64;
    let start = domain.start.floor().max(0.0);
    let end = domain.end.floor().min(last);
    if end < start {
        return None;
    }
    Some(start as usize..=end as usize)
}

/// Min/max of every OHLC price, padded by `price_padding_pct` of the span.
/// A flat slice is widened around its price instead.
fn fit_prices(candles: &[Candle]) -> Option<PriceDomain> {
    let (lo, hi) = match candles.iter().flat_map(Candle::prices).minmax() {
        MinMaxResult::NoElements => return None,
        MinMaxResult::OneElement(p) => (p, p),
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
    };
    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }

    let span = hi - lo;
    if span < CHART.min_price_range {
        let pad = (hi.abs() * CHART.flat_price_pad_pct).max(CHART.min_price_range);
        return Some(PriceDomain::new(lo - pad, hi + pad));
    }
    let padding = span * CHART.price_padding_pct;
    Some(PriceDomain::new(lo - padding, hi + padding))
}

/// Owns the visible index window, the visible price window and the pixel size.
///
/// Every mutation either lands in a valid state or is rejected and leaves the
/// previous state untouched (the `bool` results report which).
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    index: IndexDomain,
    price: PriceDomain,
    range: ChartRange,
    series_len: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            index: IndexDomain::new(0.0, CHART.default_visible_count as f64),
            price: PriceDomain::new(0.0, 1.0),
            range: ChartRange::new(CHART.default_width as f64, CHART.default_height as f64),
            series_len: 0,
        }
    }
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        let mut viewport = Self::default();
        viewport.resize(width, height);
        viewport
    }

    pub fn index_domain(&self) -> IndexDomain {
        self.index
    }

    pub fn price_domain(&self) -> PriceDomain {
        self.price
    }

    pub fn domain(&self) -> ChartDomain {
        ChartDomain {
            index: self.index,
            price: self.price,
        }
    }

    pub fn range(&self) -> ChartRange {
        self.range
    }

    pub fn series_len(&self) -> usize {
        self.series_len
    }

    /// Furthest the right edge may reach: last candle plus the future buffer.
    pub fn max_end(&self) -> f64 {
        (self.series_len as f64 - 1.0).max(0.0) + CHART.max_future_buffer
    }

    /// Fresh layout for a newly loaded series: the newest candles in view,
    /// a short blank buffer on the right, prices fitted to what is visible.
    pub fn initialize(&mut self, candles: &[Candle], width: f64, height: f64) {
        self.resize(width, height);
        self.series_len = candles.len();
        if candles.is_empty() {
            return;
        }

        let len = candles.len() as f64;
        let shown = CHART.default_visible_count.min(candles.len()) as f64;
        let start = len - shown;
        let mut end = len - 1.0 + CHART.initial_future_buffer;
        if end - start < CHART.min_zoom_range {
            end = start + CHART.min_zoom_range;
        }
        self.index = IndexDomain::new(start, end);
        self.auto_fit_y(candles);
    }

    /// Ignores non-positive or non-finite sizes.
    pub fn resize(&mut self, width: f64, height: f64) -> bool {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return false;
        }
        self.range = ChartRange::new(width, height);
        true
    }

    /// Rescale the index window around its center. `factor > 1` zooms out.
    pub fn zoom_x(&mut self, factor: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let width = self.index.width() * factor;
        let widest = self.series_len as f64 + CHART.max_future_buffer;
        if width < CHART.min_zoom_range || width > widest {
            return false;
        }

        let center = self.index.center();
        let candidate = IndexDomain::new(center - width / 2.0, center + width / 2.0);
        self.index = self.clamp_window(candidate);
        true
    }

    /// Shift the index window by `delta` candles, sliding (not shrinking) at the edges.
    pub fn pan_x(&mut self, delta: f64) -> bool {
        if !delta.is_finite() {
            return false;
        }
        let candidate = IndexDomain::new(self.index.start + delta, self.index.end + delta);
        let clamped = self.clamp_window(candidate);
        if clamped == self.index {
            return false;
        }
        self.index = clamped;
        true
    }

    pub fn pan_y(&mut self, delta: f64) -> bool {
        if !delta.is_finite() || delta == 0.0 {
            return false;
        }
        let shifted = PriceDomain::new(self.price.min + delta, self.price.max + delta);
        if !shifted.min.is_finite() || !shifted.max.is_finite() {
            return false;
        }
        self.price = shifted;
        true
    }

    /// Rescale the price window around its center. `factor > 1` zooms out.
    pub fn zoom_y(&mut self, factor: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let range = self.price.range() * factor;
        if !range.is_finite() || range < CHART.min_price_range {
            return false;
        }
        let center = self.price.center();
        self.price = PriceDomain::new(center - range / 2.0, center + range / 2.0);
        true
    }

    /// Fit the price window to the candles currently in view.
    pub fn auto_fit_y(&mut self, candles: &[Candle]) -> bool {
        let Some(visible) = visible_indices(&self.index, candles.len()) else {
            return false;
        };
        match fit_prices(&candles[visible]) {
            Some(price) => {
                self.price = price;
                true
            }
            None => false,
        }
    }

    /// Keep the same candles in view after `added` candles were appended.
    pub fn shift_for_growth(&mut self, added: usize) {
        if added == 0 {
            return;
        }
        let shift = added as f64;
        self.series_len += added;
        self.index = IndexDomain::new(self.index.start + shift, self.index.end + shift);
    }

    /// Re-clamp the window against a new series length without a full reset.
    pub fn set_series_len(&mut self, len: usize) {
        self.series_len = len;
        self.index = self.clamp_window(self.index);
    }

    fn clamp_window(&self, domain: IndexDomain) -> IndexDomain {
        let width = domain.width();
        let max_end = self.max_end();
        let (mut start, mut end) = (domain.start, domain.end);
        if start < 0.0 {
            start = 0.0;
            end = width;
        }
        if end > max_end {
            end = max_end;
            start = (max_end - width).max(0.0);
        }
        IndexDomain::new(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(len: usize) -> Vec<Candle> {
        (0..len)
            .map(|i| {
                let base = 100.0 + i as f64;
                Candle::new(1_000 + i as i64 * 60_000, base, base + 2.0, base - 2.0, base + 1.0, 1.0)
            })
            .collect()
    }

    fn loaded(len: usize) -> (Viewport, Vec<Candle>) {
        let candles = series(len);
        let mut viewport = Viewport::default();
        viewport.initialize(&candles, 800.0, 400.0);
        (viewport, candles)
    }

    fn assert_invariants(viewport: &Viewport) {
        let domain = viewport.index_domain();
        assert!(domain.start >= 0.0, "start {}", domain.start);
        assert!(domain.width() >= CHART.min_zoom_range, "width {}", domain.width());
        assert!(domain.end <= viewport.max_end() + 1e-9);
    }

    #[test]
    fn initialize_shows_latest_candles_with_buffer() {
        let (viewport, _) = loaded(120);
        let domain = viewport.index_domain();
        assert_eq!(domain.start, 70.0);
        assert_eq!(domain.end, 124.0);

        // visible slice is candles 70..=119: low 168, high 221, padding 5.3
        let price = viewport.price_domain();
        assert!((price.min - 162.7).abs() < 1e-9);
        assert!((price.max - 226.3).abs() < 1e-9);
    }

    #[test]
    fn short_series_still_gets_minimum_width() {
        let (viewport, _) = loaded(3);
        let domain = viewport.index_domain();
        assert_eq!(domain.start, 0.0);
        assert_eq!(domain.width(), CHART.min_zoom_range);
    }

    #[test]
    fn empty_series_keeps_previous_domain() {
        let mut viewport = Viewport::default();
        let before = viewport.index_domain();
        viewport.initialize(&[], 640.0, 480.0);
        assert_eq!(viewport.index_domain(), before);
        assert_eq!(viewport.range(), ChartRange::new(640.0, 480.0));
    }

    #[test]
    fn zoom_keeps_center_and_rejects_degenerate_widths() {
        let (mut viewport, _) = loaded(200);
        let center = viewport.index_domain().center();

        assert!(viewport.zoom_x(0.5));
        assert!((viewport.index_domain().center() - center).abs() < 1e-9);

        let before = viewport.index_domain();
        assert!(!viewport.zoom_x(0.1));
        assert!(!viewport.zoom_x(f64::NAN));
        assert!(!viewport.zoom_x(-2.0));
        assert!(!viewport.zoom_x(100.0));
        assert_eq!(viewport.index_domain(), before);
    }

    #[test]
    fn zoom_near_left_edge_slides_instead_of_shrinking() {
        let (mut viewport, _) = loaded(200);
        viewport.pan_x(-1_000.0);
        assert_eq!(viewport.index_domain().start, 0.0);

        let width = viewport.index_domain().width();
        assert!(viewport.zoom_x(1.5));
        let domain = viewport.index_domain();
        assert_eq!(domain.start, 0.0);
        assert!((domain.width() - width * 1.5).abs() < 1e-9);
    }

    #[test]
    fn pan_clamps_at_both_edges_preserving_width() {
        let (mut viewport, _) = loaded(100);
        let width = viewport.index_domain().width();

        viewport.pan_x(-500.0);
        assert_eq!(viewport.index_domain().start, 0.0);
        assert_eq!(viewport.index_domain().width(), width);
        assert!(!viewport.pan_x(-1.0));

        viewport.pan_x(500.0);
        assert_eq!(viewport.index_domain().end, viewport.max_end());
        assert!((viewport.index_domain().width() - width).abs() < 1e-9);
    }

    #[test]
    fn mixed_navigation_never_breaks_invariants() {
        let (mut viewport, _) = loaded(150);
        let factors = [0.9, 1.1, 0.5, 2.0, 0.8, 1.2, 3.0, 0.3];
        let deltas = [-40.0, 13.5, 300.0, -7.25, -900.0, 55.0];
        for step in 0..200 {
            viewport.zoom_x(factors[step % factors.len()]);
            assert_invariants(&viewport);
            viewport.pan_x(deltas[step % deltas.len()]);
            assert_invariants(&viewport);
        }
    }

    #[test]
    fn pan_y_and_zoom_y_move_price_window() {
        let (mut viewport, _) = loaded(60);
        let before = viewport.price_domain();

        assert!(viewport.pan_y(10.0));
        assert!((viewport.price_domain().min - (before.min + 10.0)).abs() < 1e-9);
        assert!((viewport.price_domain().range() - before.range()).abs() < 1e-9);

        assert!(viewport.zoom_y(2.0));
        assert!((viewport.price_domain().range() - before.range() * 2.0).abs() < 1e-9);
        assert!(!viewport.zoom_y(0.0));
        assert!(!viewport.zoom_y(1e-20));
    }

    #[test]
    fn auto_fit_uses_only_visible_candles() {
        let (mut viewport, candles) = loaded(200);
        viewport.pan_x(-1_000.0);
        assert!(viewport.auto_fit_y(&candles));

        // window 0..=54 covers candles 0..=54: low 98, high 156, padding 5.8
        let price = viewport.price_domain();
        assert!((price.min - 92.2).abs() < 1e-9);
        assert!((price.max - 161.8).abs() < 1e-9);
    }

    #[test]
    fn flat_prices_expand_around_the_price() {
        let candles: Vec<Candle> = (0..20)
            .map(|i| Candle::new(1 + i, 50.0, 50.0, 50.0, 50.0, 0.0))
            .collect();
        let mut viewport = Viewport::default();
        viewport.initialize(&candles, 800.0, 400.0);
        let price = viewport.price_domain();
        assert!(price.max > price.min);
        assert!((price.center() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn growth_shift_keeps_the_same_candles_in_view() {
        let (mut viewport, _) = loaded(100);
        let before = viewport.index_domain();
        viewport.shift_for_growth(2);
        assert_eq!(viewport.index_domain().start, before.start + 2.0);
        assert_eq!(viewport.index_domain().end, before.end + 2.0);
        assert_eq!(viewport.series_len(), 102);
    }

    #[test]
    fn shorter_series_pulls_window_back_in_range() {
        let (mut viewport, _) = loaded(300);
        viewport.set_series_len(40);
        assert_invariants(&viewport);
        assert_eq!(viewport.index_domain().end, viewport.max_end());
    }

    #[test]
    fn visible_indices_floor_and_clamp() {
        assert_eq!(visible_indices(&IndexDomain::new(-3.5, 4.9), 10), Some(0..=4));
        assert_eq!(visible_indices(&IndexDomain::new(7.2, 40.0), 10), Some(7..=9));
        assert_eq!(visible_indices(&IndexDomain::new(12.0, 40.0), 10), None);
        assert_eq!(visible_indices(&IndexDomain::new(0.0, 10.0), 0), None);
    }
}
