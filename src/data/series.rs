use crate::{
    chart::{IndexDomain, visible_indices},
    domain::Candle,
};

#[cfg(debug_assertions)]
use crate::config::DF;

/// Outcome of feeding one streamed candle into a [`SeriesStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// Same bucket as the last candle. `changed` is false for a repeated tick.
    Updated { changed: bool },
    /// New bucket pushed; `dropped` oldest candles fell off the retention window.
    Appended { dropped: usize },
    /// Stale, duplicate-older or malformed tick.
    Ignored,
}

impl Reconciled {
    pub fn is_new_candle(&self) -> bool {
        matches!(self, Reconciled::Appended { .. })
    }

    pub fn changed(&self) -> bool {
        match self {
            Reconciled::Updated { changed } => *changed,
            Reconciled::Appended { .. } => true,
            Reconciled::Ignored => false,
        }
    }
}

/// Ordered candles for one symbol and interval.
///
/// `reconcile` is the only path that mutates an existing candle, and it only ever
/// touches the newest one.
#[derive(Debug, Clone, Default)]
pub struct SeriesStore {
    candles: Vec<Candle>,
    limit: usize,
    version: u64,
}

impl SeriesStore {
    pub fn new(limit: usize) -> Self {
        Self {
            candles: Vec::new(),
            limit: limit.max(1),
            version: 0,
        }
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bumped on every observable change; cheap cache key for derived data.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn current_price(&self) -> Option<f64> {
        self.last().map(|c| c.close_price)
    }

    /// Wholesale replacement from a REST snapshot.
    /// Invalid candles are dropped, timestamps sorted and deduplicated (later wins),
    /// and only the newest `limit` kept. Returns the resulting length.
    pub fn replace(&mut self, mut candles: Vec<Candle>) -> usize {
        #[cfg(debug_assertions)]
        let before = candles.len();
        candles.retain(Candle::is_valid);
        candles.sort_by_key(|c| c.timestamp_ms);
        // keep the later of two equal timestamps
        candles.reverse();
        candles.dedup_by_key(|c| c.timestamp_ms);
        candles.reverse();

        if candles.len() > self.limit {
            let excess = candles.len() - self.limit;
            candles.drain(..excess);
        }

        #[cfg(debug_assertions)]
        if DF.log_candle_update && candles.len() != before {
            log::info!(
                "Series replace kept {} of {} candles (limit {})",
                candles.len(),
                before,
                self.limit
            );
        }

        self.candles = candles;
        self.version += 1;
        self.candles.len()
    }

    /// Merge one streamed candle: same bucket updates in place, a newer bucket appends.
    pub fn reconcile(&mut self, tick: &Candle) -> Reconciled {
        if !tick.is_valid() {
            return Reconciled::Ignored;
        }

        let outcome = match self.candles.last_mut() {
            Some(last) if tick.timestamp_ms == last.timestamp_ms => {
                let merged = Candle {
                    timestamp_ms: last.timestamp_ms,
                    open_price: tick.open_price,
                    high_price: last.high_price.max(tick.high_price),
                    low_price: last.low_price.min(tick.low_price),
                    close_price: tick.close_price,
                    volume: tick.volume,
                };
                let changed = merged != *last;
                *last = merged;
                Reconciled::Updated { changed }
            }
            Some(last) if tick.timestamp_ms < last.timestamp_ms => Reconciled::Ignored,
            _ => {
                self.candles.push(*tick);
                let dropped = self.candles.len().saturating_sub(self.limit);
                if dropped > 0 {
                    self.candles.drain(..dropped);
                }
                Reconciled::Appended { dropped }
            }
        };

        if outcome.changed() {
            self.version += 1;
        }

        #[cfg(debug_assertions)]
        if DF.log_candle_update {
            log::info!("Reconcile t={} -> {:?}", tick.timestamp_ms, outcome);
        }

        outcome
    }

    /// How many candles were added relative to an earlier length.
    pub fn growth_since(&self, previous_len: usize) -> usize {
        self.candles.len().saturating_sub(previous_len)
    }

    /// Real candles inside the index window (floor/clamp rules of [`visible_indices`]).
    pub fn visible_slice(&self, domain: &IndexDomain) -> &[Candle] {
        match visible_indices(domain, self.candles.len()) {
            Some(range) => &self.candles[range],
            None => &[],
        }
    }

    /// Index of the first candle shown by [`Self::visible_slice`].
    pub fn visible_offset(&self, domain: &IndexDomain) -> usize {
        visible_indices(domain, self.candles.len())
            .map(|r| *r.start())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(ts: i64, close: f64) -> Candle {
        Candle::new(ts, close - 1.0, close + 1.0, close - 2.0, close, 10.0)
    }

    fn store_with(timestamps: &[i64], limit: usize) -> SeriesStore {
        let mut store = SeriesStore::new(limit);
        store.replace(timestamps.iter().map(|&t| candle(t, 100.0)).collect());
        store
    }

    #[test]
    fn same_timestamp_updates_in_place() {
        let mut store = store_with(&[80, 90, 100], 10);
        let tick = Candle::new(100, 99.5, 104.0, 97.5, 103.0, 25.0);

        assert_eq!(store.reconcile(&tick), Reconciled::Updated { changed: true });
        assert_eq!(store.len(), 3);
        let last = store.last().copied().unwrap();
        assert_eq!(last.close_price, 103.0);
        assert_eq!(last.volume, 25.0);
        assert_eq!(last.high_price, 104.0);
        // low never narrows inside a bucket
        assert_eq!(last.low_price, 97.5);
        assert_eq!(store.current_price(), Some(103.0));
    }

    #[test]
    fn high_low_only_widen() {
        let mut store = store_with(&[100], 10);
        let inside = Candle::new(100, 99.0, 100.5, 99.0, 100.2, 11.0);
        store.reconcile(&inside);
        let last = store.last().copied().unwrap();
        assert_eq!(last.high_price, 101.0);
        assert_eq!(last.low_price, 98.0);
    }

    #[test]
    fn repeated_tick_is_idempotent() {
        let mut store = store_with(&[100], 10);
        let tick = candle(100, 105.0);
        store.reconcile(&tick);
        let snapshot = store.candles().to_vec();
        let version = store.version();

        assert_eq!(store.reconcile(&tick), Reconciled::Updated { changed: false });
        assert_eq!(store.candles(), snapshot.as_slice());
        assert_eq!(store.version(), version);
    }

    #[test]
    fn newer_timestamp_appends() {
        let mut store = store_with(&[80, 90, 100], 10);
        let outcome = store.reconcile(&candle(110, 101.0));
        assert_eq!(outcome, Reconciled::Appended { dropped: 0 });
        assert!(outcome.is_new_candle());
        assert_eq!(store.len(), 4);
        assert_eq!(store.last().map(|c| c.timestamp_ms), Some(110));
        assert_eq!(store.growth_since(3), 1);
    }

    #[test]
    fn append_past_limit_drops_oldest() {
        let mut store = store_with(&[10, 20, 30], 3);
        assert_eq!(
            store.reconcile(&candle(40, 1.0)),
            Reconciled::Appended { dropped: 1 }
        );
        let stamps: Vec<i64> = store.candles().iter().map(|c| c.timestamp_ms).collect();
        assert_eq!(stamps, vec![20, 30, 40]);
    }

    #[test]
    fn stale_and_malformed_ticks_are_ignored() {
        let mut store = store_with(&[80, 90, 100], 10);
        let version = store.version();

        assert_eq!(store.reconcile(&candle(90, 1.0)), Reconciled::Ignored);
        let broken = Candle::new(110, 1.0, f64::NAN, 0.5, 1.0, 1.0);
        assert_eq!(store.reconcile(&broken), Reconciled::Ignored);
        assert_eq!(store.len(), 3);
        assert_eq!(store.version(), version);
    }

    #[test]
    fn first_tick_into_empty_store_appends() {
        let mut store = SeriesStore::new(5);
        assert!(store.reconcile(&candle(100, 1.0)).is_new_candle());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn replace_sorts_dedups_and_trims() {
        let mut store = SeriesStore::new(3);
        let len = store.replace(vec![
            candle(30, 1.0),
            candle(10, 1.0),
            candle(20, 1.0),
            candle(20, 7.0),
            candle(40, 1.0),
            Candle::new(50, 1.0, 0.5, 0.0, 1.0, 1.0),
        ]);
        assert_eq!(len, 3);
        let stamps: Vec<i64> = store.candles().iter().map(|c| c.timestamp_ms).collect();
        assert_eq!(stamps, vec![20, 30, 40]);
        assert_eq!(store.candles()[0].close_price, 7.0);
    }

    #[test]
    fn visible_slice_floors_and_clamps() {
        let store = store_with(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10], 100);
        let slice = store.visible_slice(&IndexDomain::new(2.7, 50.0));
        assert_eq!(slice.len(), 8);
        assert_eq!(slice[0].timestamp_ms, 3);
        assert_eq!(store.visible_offset(&IndexDomain::new(2.7, 50.0)), 2);
        assert!(store.visible_slice(&IndexDomain::new(20.0, 40.0)).is_empty());
    }
}
