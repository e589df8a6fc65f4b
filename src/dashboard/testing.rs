//! In-memory `ReadingSource` for orchestrator tests.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::source::{self, Endpoint, Reading, ReadingSource, SourceError};

pub(crate) fn reading(id: i64, t: f64, h: f64) -> Reading {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "device_id": "ws-01",
        "ts": format!("2025-06-01T12:{:02}:00Z", id % 60),
        "t": t,
        "h": h,
    }))
    .unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Call {
    Latest,
    History(u32),
}

type Scripted<T> = std::result::Result<T, u16>;

/// Answers with scripted payloads (or HTTP status failures) and records every
/// call. History responses can be held back to force completion order.
#[derive(Default)]
pub(crate) struct FakeSource {
    calls: Mutex<Vec<Call>>,
    latest: Mutex<Option<Scripted<Option<Reading>>>>,
    history: Mutex<Option<Scripted<Vec<Reading>>>>,
    held: Mutex<VecDeque<oneshot::Receiver<Scripted<Vec<Reading>>>>>,
}

impl FakeSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_latest(&self, outcome: Scripted<Option<Reading>>) {
        *self.latest.lock().unwrap() = Some(outcome);
    }

    pub fn set_history(&self, outcome: Scripted<Vec<Reading>>) {
        *self.history.lock().unwrap() = Some(outcome);
    }

    /// The next history call waits until the returned sender fires.
    pub fn hold_next_history(&self) -> oneshot::Sender<Scripted<Vec<Reading>>> {
        let (tx, rx) = oneshot::channel();
        self.held.lock().unwrap().push_back(rx);
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn latest_calls(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Latest).count()
    }

    pub fn history_calls(&self) -> Vec<u32> {
        self.calls()
            .iter()
            .filter_map(|c| match c {
                Call::History(h) => Some(*h),
                Call::Latest => None,
            })
            .collect()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl ReadingSource for FakeSource {
    async fn fetch_latest(&self, _device_id: &str) -> source::Result<Option<Reading>> {
        self.calls.lock().unwrap().push(Call::Latest);
        let outcome = self.latest.lock().unwrap().clone().unwrap_or(Ok(None));
        outcome.map_err(|status| SourceError::Status { endpoint: Endpoint::Latest, status })
    }

    async fn fetch_history(&self, _device_id: &str, lookback_hours: u32) -> source::Result<Vec<Reading>> {
        self.calls.lock().unwrap().push(Call::History(lookback_hours));
        let held = self.held.lock().unwrap().pop_front();
        let scripted = self.history.lock().unwrap().clone();
        let outcome = match held {
            Some(rx) => rx.await.unwrap_or(Ok(Vec::new())),
            None => scripted.unwrap_or(Ok(Vec::new())),
        };
        outcome.map_err(|status| SourceError::Status { endpoint: Endpoint::History, status })
    }
}
