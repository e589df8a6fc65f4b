use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::{
    derived::DerivedMetrics,
    preferences::{Persisted, Storage},
    ranges::{ChartGroup, RangeKey},
    source::{Reading, SourceError},
};

/// Number of dashboard pages: 0 = tiles, 1 = charts.
pub const PAGES: usize = 2;

// ---------------------------------------------------------------------------
// Stream
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// One independently fetched piece of data together with its request
/// bookkeeping. Every request gets a sequence number; a completion that is
/// older than the last one applied is discarded.
#[derive(Debug, Clone)]
pub struct Stream<T> {
    phase: Phase,
    /// Phase in the most recently published snapshot.
    published: Phase,
    data: T,
    issued: u64,
    applied: u64,
}

impl<T: PartialEq> Stream<T> {
    fn new(data: T) -> Self {
        Self {
            phase: Phase::Idle,
            published: Phase::Idle,
            data,
            issued: 0,
            applied: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    /// Registers a new request and returns its sequence number.
    pub(crate) fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.phase = Phase::Loading;
        self.issued
    }

    /// Returns `false` when `seq` is stale and must be ignored.
    fn settle(&mut self, seq: u64, ok: bool) -> bool {
        if seq <= self.applied {
            return false;
        }
        self.applied = seq;
        // Stay Loading while a newer request is still out.
        if seq == self.issued {
            self.phase = if ok { Phase::Ready } else { Phase::Failed };
        }
        true
    }

    /// Whether the phase differs from what the last snapshot showed.
    fn unpublished(&self) -> bool {
        self.phase != self.published
    }

    fn replace(&mut self, data: T) -> bool {
        if self.data == data {
            return false;
        }
        self.data = data;
        true
    }
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Preferences {
    auto_refresh: Persisted<bool>,
    page: Persisted<usize>,
    /// Indexed by `ChartGroup as usize`.
    ranges: [Persisted<RangeKey>; 4],
}

impl Preferences {
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let mut page = Persisted::load(storage.clone(), "wa_page", 0usize);
        if *page.get() >= PAGES {
            page.set(PAGES - 1);
        }

        Self {
            auto_refresh: Persisted::load(storage.clone(), "auto_refresh", true),
            page,
            ranges: ChartGroup::ALL
                .map(|g| Persisted::load(storage.clone(), g.preference_key(), RangeKey::DEFAULT)),
        }
    }

    pub fn auto_refresh(&self) -> bool {
        *self.auto_refresh.get()
    }

    pub fn page(&self) -> usize {
        *self.page.get()
    }

    pub fn range(&self, group: ChartGroup) -> RangeKey {
        *self.ranges[group as usize].get()
    }

    pub(crate) fn set_auto_refresh(&mut self, enabled: bool) -> bool {
        if self.auto_refresh() == enabled {
            return false;
        }
        self.auto_refresh.set(enabled);
        true
    }

    /// Stores `page` clamped into the valid range; returns the stored value.
    pub(crate) fn set_page(&mut self, page: usize) -> usize {
        let page = page.min(PAGES - 1);
        if self.page() != page {
            self.page.set(page);
        }
        page
    }

    pub(crate) fn set_range(&mut self, group: ChartGroup, key: RangeKey) -> bool {
        if self.range(group) == key {
            return false;
        }
        self.ranges[group as usize].set(key);
        true
    }
}

// ---------------------------------------------------------------------------
// DashboardState
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct DashboardState {
    pub(crate) latest: Stream<Option<Reading>>,
    /// Indexed by `ChartGroup as usize`.
    pub(crate) history: [Stream<Vec<Reading>>; 4],
    pub(crate) error: Option<String>,
    pub(crate) derived: DerivedMetrics,
    pub(crate) prefs: Preferences,
}

impl DashboardState {
    pub fn new(prefs: Preferences) -> Self {
        Self {
            latest: Stream::new(None),
            history: ChartGroup::ALL.map(|_| Stream::new(Vec::new())),
            error: None,
            derived: DerivedMetrics::default(),
            prefs,
        }
    }

    pub fn history(&self, group: ChartGroup) -> &Stream<Vec<Reading>> {
        &self.history[group as usize]
    }

    pub(crate) fn history_mut(&mut self, group: ChartGroup) -> &mut Stream<Vec<Reading>> {
        &mut self.history[group as usize]
    }

    /// Applies a latest-reading completion. Returns whether anything the user
    /// sees has changed since the last published snapshot.
    pub(crate) fn apply_latest(
        &mut self,
        seq: u64,
        result: Result<Option<Reading>, SourceError>,
    ) -> bool {
        if !self.latest.settle(seq, result.is_ok()) {
            debug!(seq, "Discarding stale latest response");
            return false;
        }
        match result {
            Ok(reading) => {
                let replaced = self.latest.replace(reading);
                if replaced {
                    self.recompute();
                }
                self.clear_error() | replaced | self.latest.unpublished()
            }
            Err(e) => self.set_error(e.to_string()) | self.latest.unpublished(),
        }
    }

    pub(crate) fn apply_history(
        &mut self,
        group: ChartGroup,
        seq: u64,
        result: Result<Vec<Reading>, SourceError>,
    ) -> bool {
        if !self.history_mut(group).settle(seq, result.is_ok()) {
            debug!(group = %group, seq, "Discarding stale history response");
            return false;
        }
        match result {
            Ok(series) => {
                let replaced = self.history_mut(group).replace(series);
                if replaced && group == ChartGroup::Environment {
                    self.recompute();
                }
                self.clear_error() | replaced | self.history(group).unpublished()
            }
            Err(e) => self.set_error(e.to_string()) | self.history(group).unpublished(),
        }
    }

    fn recompute(&mut self) {
        self.derived = DerivedMetrics::compute(
            self.latest.data.as_ref(),
            &self.history[ChartGroup::Environment as usize].data,
        );
    }

    fn clear_error(&mut self) -> bool {
        self.error.take().is_some()
    }

    fn set_error(&mut self, message: String) -> bool {
        if self.error.as_deref() == Some(message.as_str()) {
            return false;
        }
        self.error = Some(message);
        true
    }

    /// Takes the snapshot handed to the renderer. Phase changes before the
    /// next one are only reported once they differ from what it showed.
    pub fn publish(&mut self, device_id: &str) -> DashboardSnapshot {
        self.latest.published = self.latest.phase;
        for stream in &mut self.history {
            stream.published = stream.phase;
        }
        self.snapshot(device_id)
    }

    pub fn snapshot(&self, device_id: &str) -> DashboardSnapshot {
        DashboardSnapshot {
            device_id: device_id.to_owned(),
            latest: self.latest.data.clone(),
            latest_phase: self.latest.phase,
            charts: ChartGroup::ALL
                .iter()
                .map(|&group| {
                    let stream = self.history(group);
                    ChartSnapshot {
                        group,
                        range: self.prefs.range(group),
                        phase: stream.phase,
                        series: stream.data.clone(),
                    }
                })
                .collect(),
            derived: self.derived.clone(),
            error: self.error.clone(),
            auto_refresh: self.prefs.auto_refresh(),
            page: self.prefs.page(),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Everything a presentation adapter needs, detached from the live state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub device_id: String,
    pub latest: Option<Reading>,
    pub latest_phase: Phase,
    pub charts: Vec<ChartSnapshot>,
    pub derived: DerivedMetrics,
    pub error: Option<String>,
    pub auto_refresh: bool,
    pub page: usize,
}

impl DashboardSnapshot {
    pub fn chart(&self, group: ChartGroup) -> Option<&ChartSnapshot> {
        self.charts.iter().find(|c| c.group == group)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSnapshot {
    pub group: ChartGroup,
    pub range: RangeKey,
    pub phase: Phase,
    pub series: Vec<Reading>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dashboard::testing::reading,
        preferences::MemoryStorage,
        source::Endpoint,
    };

    fn state() -> DashboardState {
        DashboardState::new(Preferences::load(Arc::new(MemoryStorage::new())))
    }

    fn http(status: u16) -> SourceError {
        SourceError::Status { endpoint: Endpoint::Latest, status }
    }

    #[test]
    fn stream_phases() {
        let mut s = Stream::new(0u8);
        assert_eq!(s.phase(), Phase::Idle);
        let a = s.begin();
        assert_eq!(s.phase(), Phase::Loading);
        assert!(s.settle(a, true));
        assert_eq!(s.phase(), Phase::Ready);
        let b = s.begin();
        assert!(s.settle(b, false));
        assert_eq!(s.phase(), Phase::Failed);
    }

    #[test]
    fn stream_discards_out_of_order_completion() {
        let mut s = Stream::new(0u8);
        let older = s.begin();
        let newer = s.begin();
        assert!(s.settle(newer, true));
        assert!(!s.settle(older, true));
        assert_eq!(s.phase(), Phase::Ready);
    }

    #[test]
    fn stream_stays_loading_while_newer_request_is_out() {
        let mut s = Stream::new(0u8);
        let older = s.begin();
        let _newer = s.begin();
        assert!(s.settle(older, true));
        assert_eq!(s.phase(), Phase::Loading);
    }

    #[test]
    fn failure_keeps_previous_data_and_sets_error() {
        let mut st = state();
        let seq = st.latest.begin();
        assert!(st.apply_latest(seq, Ok(Some(reading(1, 22.5, 60.0)))));
        let feels = st.derived.feels_like;
        assert!(feels.is_some());

        let seq = st.latest.begin();
        assert!(st.apply_latest(seq, Err(http(500))));
        assert_eq!(st.latest.data().as_ref().unwrap().temperature, Some(22.5));
        assert_eq!(st.derived.feels_like, feels);
        assert_eq!(st.error.as_deref(), Some("latest: HTTP 500"));
        assert_eq!(st.latest.phase(), Phase::Failed);
    }

    #[test]
    fn any_success_clears_shared_error() {
        let mut st = state();
        let seq = st.latest.begin();
        st.apply_latest(seq, Err(http(503)));
        assert!(st.error.is_some());

        let seq = st.history_mut(ChartGroup::Air).begin();
        assert!(st.apply_history(ChartGroup::Air, seq, Ok(vec![])));
        assert_eq!(st.error, None);
    }

    #[test]
    fn identical_payload_is_not_a_change() {
        let mut st = state();
        let series = vec![reading(1, 20.0, 50.0), reading(2, 21.0, 51.0)];

        let seq = st.history_mut(ChartGroup::Environment).begin();
        assert!(st.apply_history(ChartGroup::Environment, seq, Ok(series.clone())));
        let before = st.publish("ws-01");

        let seq = st.history_mut(ChartGroup::Environment).begin();
        assert!(!st.apply_history(ChartGroup::Environment, seq, Ok(series)));
        assert_eq!(st.snapshot("ws-01"), before);
    }

    #[test]
    fn shown_loading_phase_is_a_change_when_it_settles() {
        let mut st = state();
        let seq = st.latest.begin();
        let during = st.publish("ws-01");
        assert_eq!(during.latest_phase, Phase::Loading);

        assert!(st.apply_latest(seq, Ok(None)));
        assert_eq!(st.snapshot("ws-01").latest_phase, Phase::Ready);
    }

    #[test]
    fn unseen_loading_phase_is_not_a_change() {
        let mut st = state();
        let seq = st.latest.begin();
        st.apply_latest(seq, Ok(Some(reading(1, 22.5, 60.0))));
        st.publish("ws-01");

        let seq = st.latest.begin();
        assert!(!st.apply_latest(seq, Ok(Some(reading(1, 22.5, 60.0)))));
    }

    #[test]
    fn failure_with_same_message_still_reports_phase() {
        let mut st = state();
        let seq = st.history_mut(ChartGroup::Air).begin();
        st.apply_history(ChartGroup::Air, seq, Err(http(502)));

        let seq = st.history_mut(ChartGroup::Air).begin();
        st.publish("ws-01");
        assert!(st.apply_history(ChartGroup::Air, seq, Err(http(502))));
        assert_eq!(st.history(ChartGroup::Air).phase(), Phase::Failed);
    }

    #[test]
    fn environment_history_drives_temperature_bounds() {
        let mut st = state();
        let seq = st.history_mut(ChartGroup::Environment).begin();
        st.apply_history(
            ChartGroup::Environment,
            seq,
            Ok(vec![reading(1, 17.0, 50.0), reading(2, 25.0, 40.0)]),
        );
        assert_eq!(st.derived.temp_low, Some(17.0));
        assert_eq!(st.derived.temp_high, Some(25.0));

        let seq = st.history_mut(ChartGroup::Vibration).begin();
        st.apply_history(ChartGroup::Vibration, seq, Ok(vec![reading(3, 40.0, 10.0)]));
        assert_eq!(st.derived.temp_high, Some(25.0));
    }

    #[test]
    fn page_is_clamped_on_load_and_set() {
        let mem = MemoryStorage::new();
        mem.store("wa_page", "7".to_owned());
        let mut prefs = Preferences::load(Arc::new(mem.clone()));
        assert_eq!(prefs.page(), PAGES - 1);
        assert_eq!(mem.load("wa_page").as_deref(), Some("1"));
        assert_eq!(prefs.set_page(42), PAGES - 1);
        assert_eq!(prefs.set_page(0), 0);
    }

    #[test]
    fn preferences_default_values() {
        let prefs = Preferences::load(Arc::new(MemoryStorage::new()));
        assert!(prefs.auto_refresh());
        assert_eq!(prefs.page(), 0);
        for g in ChartGroup::ALL {
            assert_eq!(prefs.range(g), RangeKey::Day);
        }
    }
}
