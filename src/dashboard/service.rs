use std::sync::Arc;

use tokio::{
    sync::{watch, RwLock},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    dashboard::state::{DashboardSnapshot, DashboardState, Preferences},
    preferences::Storage,
    ranges::{ChartGroup, RangeKey},
    source::ReadingSource,
};

/// Owns the dashboard state and issues every fetch.
///
/// Cheap to clone; clones share state. Fetches started through the `spawn_*`
/// methods are fire-and-forget: nothing cancels them, and an older response
/// that arrives after a newer one has been applied is dropped.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn ReadingSource>,
    device_id: String,
    state: RwLock<DashboardState>,
    /// Bumped whenever something visible changes.
    revision: watch::Sender<u64>,
    auto_refresh: watch::Sender<bool>,
    /// Bumped on every chart range change; restarts the history timer.
    ranges: watch::Sender<u64>,
}

impl Dashboard {
    pub fn new(
        source: Arc<dyn ReadingSource>,
        device_id: impl Into<String>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        let prefs = Preferences::load(storage);
        let (auto_refresh, _) = watch::channel(prefs.auto_refresh());
        let (revision, _) = watch::channel(0);
        let (ranges, _) = watch::channel(0);

        Self {
            inner: Arc::new(Inner {
                source,
                device_id: device_id.into(),
                state: RwLock::new(DashboardState::new(prefs)),
                revision,
                auto_refresh,
                ranges,
            }),
        }
    }

    /// Receiver of the revision counter; `changed()` fires on visible updates.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.inner.revision.borrow()
    }

    pub(crate) fn auto_refresh_watch(&self) -> watch::Receiver<bool> {
        self.inner.auto_refresh.subscribe()
    }

    pub(crate) fn range_watch(&self) -> watch::Receiver<u64> {
        self.inner.ranges.subscribe()
    }

    /// Current state for rendering. Load phases shown here are reported as
    /// changes when they settle, even if the data itself is identical.
    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.inner.state.write().await.publish(&self.inner.device_id)
    }

    fn bump(&self) {
        self.inner.revision.send_modify(|r| *r += 1);
    }

    // -----------------------------------------------------------------------
    // Fetches
    // -----------------------------------------------------------------------

    /// Initial load: latest reading plus every history group.
    pub fn mount(&self) -> Vec<JoinHandle<()>> {
        info!(device_id = %self.inner.device_id, "Mounting dashboard");
        let mut handles = vec![self.spawn_latest()];
        handles.extend(self.spawn_all_history());
        handles
    }

    pub fn spawn_latest(&self) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.refresh_latest().await })
    }

    pub fn spawn_history(&self, group: ChartGroup) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.refresh_history(group).await })
    }

    /// Starts all four history fetches at once; they do not wait for each
    /// other.
    pub fn spawn_all_history(&self) -> Vec<JoinHandle<()>> {
        ChartGroup::ALL
            .iter()
            .map(|&group| self.spawn_history(group))
            .collect()
    }

    pub async fn refresh_latest(&self) {
        let device_id = self.inner.device_id.as_str();
        let seq = self.inner.state.write().await.latest.begin();
        debug!(device_id = %device_id, seq, "Fetching latest reading");

        let result = self.inner.source.fetch_latest(device_id).await;
        if let Err(e) = &result {
            warn!(device_id = %device_id, error = %e, "Failed to fetch latest reading");
        }

        let changed = self.inner.state.write().await.apply_latest(seq, result);
        if changed {
            self.bump();
        }
    }

    pub async fn refresh_history(&self, group: ChartGroup) {
        let device_id = self.inner.device_id.as_str();
        let (seq, range) = {
            let mut state = self.inner.state.write().await;
            let range = state.prefs.range(group);
            (state.history_mut(group).begin(), range)
        };
        let hours = range.preset().lookback_hours;
        debug!(device_id = %device_id, group = %group, range = %range, hours, seq, "Fetching history");

        let result = self.inner.source.fetch_history(device_id, hours).await;
        match &result {
            Ok(series) => debug!(group = %group, points = series.len(), "History received"),
            Err(e) => warn!(group = %group, error = %e, "Failed to fetch history"),
        }

        let changed = self.inner.state.write().await.apply_history(group, seq, result);
        if changed {
            self.bump();
        }
    }

    // -----------------------------------------------------------------------
    // User actions
    // -----------------------------------------------------------------------

    /// Persists the new range and immediately fetches that group alone.
    /// Selecting the range already shown does nothing.
    pub async fn set_range(&self, group: ChartGroup, key: RangeKey) -> Option<JoinHandle<()>> {
        let changed = self.inner.state.write().await.prefs.set_range(group, key);
        if !changed {
            return None;
        }
        info!(group = %group, range = %key, "Chart range changed");
        self.inner.ranges.send_modify(|n| *n += 1);
        self.bump();
        Some(self.spawn_history(group))
    }

    /// Switching on also fetches the latest reading right away; switching off
    /// only stops future timer firings.
    pub async fn set_auto_refresh(&self, enabled: bool) -> Option<JoinHandle<()>> {
        let changed = self
            .inner
            .state
            .write()
            .await
            .prefs
            .set_auto_refresh(enabled);
        if !changed {
            return None;
        }
        info!(enabled, "Auto-refresh toggled");
        self.inner.auto_refresh.send_replace(enabled);
        self.bump();
        enabled.then(|| self.spawn_latest())
    }

    pub async fn toggle_auto_refresh(&self) -> Option<JoinHandle<()>> {
        let current = self.inner.state.read().await.prefs.auto_refresh();
        self.set_auto_refresh(!current).await
    }

    /// Returns the page actually selected after clamping.
    pub async fn set_page(&self, page: usize) -> usize {
        let (before, after) = {
            let mut state = self.inner.state.write().await;
            let before = state.prefs.page();
            (before, state.prefs.set_page(page))
        };
        if before != after {
            self.bump();
        }
        after
    }
}
