use {
    super::{
        pattern::{PatternAnalyzer, PatternZone},
        zone_mapping::{DisplayZone, project_zones},
    },
    crate::{
        config::{BINANCE, DEFAULT_ENABLED_TIMEFRAMES, PatternSettings},
        data::{Reconciled, SeriesStore},
        domain::{Candle, Interval},
    },
    std::collections::BTreeMap,
};

#[cfg(debug_assertions)]
use crate::config::DF;

#[derive(Debug)]
struct TimeframeSlot {
    store: SeriesStore,
    enabled: bool,
    zones: Vec<PatternZone>,
    /// Store version the cached zones were computed from.
    analyzed_version: Option<u64>,
}

impl TimeframeSlot {
    fn new(enabled: bool) -> Self {
        Self {
            store: SeriesStore::new(BINANCE.rest.retention_limit),
            enabled,
            zones: Vec::new(),
            analyzed_version: None,
        }
    }

    fn invalidate(&mut self) {
        self.zones.clear();
        self.analyzed_version = None;
    }
}

/// Pattern-zone state for every pattern timeframe of the current symbol.
/// Zones are cached per timeframe and recomputed from scratch when that series changes.
#[derive(Debug)]
pub struct TimeframeAnalysis {
    settings: PatternSettings,
    slots: BTreeMap<Interval, TimeframeSlot>,
}

impl Default for TimeframeAnalysis {
    fn default() -> Self {
        Self::new(PatternSettings::default())
    }
}

impl TimeframeAnalysis {
    pub fn new(settings: PatternSettings) -> Self {
        let slots = Interval::PATTERN_TIMEFRAMES
            .iter()
            .map(|&tf| (tf, TimeframeSlot::new(DEFAULT_ENABLED_TIMEFRAMES.contains(&tf))))
            .collect();
        Self { settings, slots }
    }

    pub fn settings(&self) -> &PatternSettings {
        &self.settings
    }

    /// Swapping settings drops every cached zone list.
    pub fn set_settings(&mut self, settings: PatternSettings) {
        if settings != self.settings {
            self.settings = settings;
            self.slots.values_mut().for_each(TimeframeSlot::invalidate);
        }
    }

    pub fn is_enabled(&self, timeframe: Interval) -> bool {
        self.slots.get(&timeframe).is_some_and(|s| s.enabled)
    }

    pub fn enabled_timeframes(&self) -> Vec<Interval> {
        self.slots
            .iter()
            .filter(|(_, s)| s.enabled)
            .map(|(&tf, _)| tf)
            .collect()
    }

    /// Returns false for timeframes that are not pattern timeframes.
    pub fn set_enabled(&mut self, timeframe: Interval, enabled: bool) -> bool {
        match self.slots.get_mut(&timeframe) {
            Some(slot) => {
                slot.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn toggle(&mut self, timeframe: Interval) -> bool {
        let enabled = !self.is_enabled(timeframe);
        self.set_enabled(timeframe, enabled) && enabled
    }

    pub fn store(&self, timeframe: Interval) -> Option<&SeriesStore> {
        self.slots.get(&timeframe).map(|s| &s.store)
    }

    pub fn replace_series(&mut self, timeframe: Interval, candles: Vec<Candle>) -> bool {
        let Some(slot) = self.slots.get_mut(&timeframe) else {
            return false;
        };
        slot.store.replace(candles);
        true
    }

    pub fn reconcile(&mut self, timeframe: Interval, tick: &Candle) -> Reconciled {
        self.slots
            .get_mut(&timeframe)
            .map_or(Reconciled::Ignored, |slot| slot.store.reconcile(tick))
    }

    /// Forget all series and zones, e.g. on a symbol change. Enabled flags survive.
    pub fn clear(&mut self) {
        for slot in self.slots.values_mut() {
            slot.store = SeriesStore::new(slot.store.limit());
            slot.invalidate();
        }
    }

    /// Recompute zones for enabled timeframes whose series moved since the last run.
    /// Returns how many timeframes were recomputed.
    pub fn refresh(&mut self) -> usize {
        if !self.settings.enabled {
            return 0;
        }
        let settings = self.settings;
        let mut recomputed = 0;

        for (&timeframe, slot) in self.slots.iter_mut() {
            let version = slot.store.version();
            if !slot.enabled || slot.analyzed_version == Some(version) {
                continue;
            }
            slot.zones = PatternAnalyzer::analyze(slot.store.candles(), timeframe, &settings);
            slot.analyzed_version = Some(version);
            recomputed += 1;

            #[cfg(debug_assertions)]
            if DF.log_zones {
                let active = slot.zones.iter().filter(|z| z.is_active).count();
                log::info!(
                    "Zones {}: {} found ({} active) over {} candles",
                    timeframe,
                    slot.zones.len(),
                    active,
                    slot.store.len()
                );
            }
        }
        recomputed
    }

    /// Cached zones for one timeframe; empty if disabled or never analysed.
    pub fn zones(&self, timeframe: Interval) -> &[PatternZone] {
        match self.slots.get(&timeframe) {
            Some(slot) if slot.enabled => &slot.zones,
            _ => &[],
        }
    }

    /// Zones of every enabled timeframe, projected onto `main`.
    pub fn display_zones(&self, main: &[Candle]) -> Vec<DisplayZone> {
        if !self.settings.enabled {
            return Vec::new();
        }
        let zones = self
            .slots
            .values()
            .filter(|s| s.enabled)
            .flat_map(|s| s.zones.iter());
        project_zones(zones, main, self.settings.break_action)
    }
}
