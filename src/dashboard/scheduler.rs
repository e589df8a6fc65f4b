use std::time::Duration;

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::dashboard::Dashboard;

/// The two refresh timers: latest reading on a short period, all history
/// groups together on a longer one. Both run only while auto-refresh is on.
/// The history timer also starts over whenever a chart range changes.
pub struct Scheduler {
    dashboard: Dashboard,
    latest_every: Duration,
    history_every: Duration,
}

/// Running timers. Dropping it leaves them running; call [`abort`](Self::abort).
pub struct SchedulerHandle {
    latest: JoinHandle<()>,
    history: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn abort(&self) {
        self.latest.abort();
        self.history.abort();
    }
}

impl Scheduler {
    /// Both periods must be non-zero.
    pub fn new(dashboard: Dashboard, latest_every: Duration, history_every: Duration) -> Self {
        Self {
            dashboard,
            latest_every,
            history_every,
        }
    }

    pub fn spawn(self) -> SchedulerHandle {
        let latest = {
            let dashboard = self.dashboard.clone();
            let enabled = dashboard.auto_refresh_watch();
            tokio::spawn(run_periodic("latest", self.latest_every, enabled, None, move || {
                dashboard.spawn_latest();
            }))
        };

        let history = {
            let dashboard = self.dashboard;
            let enabled = dashboard.auto_refresh_watch();
            let restart = Some(dashboard.range_watch());
            tokio::spawn(run_periodic("history", self.history_every, enabled, restart, move || {
                dashboard.spawn_all_history();
            }))
        };

        SchedulerHandle { latest, history }
    }
}

/// Calls `fire` every `period` while `enabled` holds `true`. Each time the
/// flag flips, or `restart` changes, the timer restarts, so the next firing
/// comes one full period later. Returns once the flag's sender is gone.
async fn run_periodic<F>(
    stream: &'static str,
    period: Duration,
    mut enabled: watch::Receiver<bool>,
    mut restart: Option<watch::Receiver<u64>>,
    mut fire: F,
) where
    F: FnMut() + Send,
{
    loop {
        if !*enabled.borrow_and_update() {
            info!(stream, "Refresh timer paused");
            if enabled.changed().await.is_err() {
                return;
            }
            continue;
        }

        info!(stream, interval_secs = period.as_secs(), "Refresh timer started");
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => fire(),
                changed = enabled.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    break;
                }
                Some(()) = restarted(&mut restart) => {
                    debug!(stream, "Refresh timer restarted");
                    break;
                }
            }
        }
    }
}

/// Resolves on the next change of `restart`; never resolves without one.
async fn restarted(restart: &mut Option<watch::Receiver<u64>>) -> Option<()> {
    match restart {
        Some(rx) => rx.changed().await.ok(),
        None => std::future::pending().await,
    }
}
