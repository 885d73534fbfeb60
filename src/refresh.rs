//! Periodic feed polling.
//!
//! Every fetch, scheduled or manual, gets a request id and reports back over one
//! channel to the UI loop, which is the only place state changes. The loop uses
//! [`StaleGuard`] so a slow response can never overwrite newer data.

use crate::feed::{FeedClient, FeedError};
use crate::model::PullRequestRecord;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub const DEFAULT_REFRESH_SECS: u64 = 20;

#[derive(Debug)]
pub struct FeedUpdate {
    pub request_id: u64,
    pub result: Result<Vec<PullRequestRecord>, FeedError>,
}

/// Shared issuer of monotonically increasing request ids.
#[derive(Debug, Clone, Default)]
pub struct RequestIds(Arc<AtomicU64>);

impl RequestIds {
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Remembers the newest applied response.
#[derive(Debug, Default)]
pub struct StaleGuard {
    newest_applied: Option<u64>,
}

impl StaleGuard {
    /// True if a successful response with this id may replace the current data.
    pub fn accept(&mut self, request_id: u64) -> bool {
        if self.newest_applied.is_some_and(|n| request_id <= n) {
            return false;
        }
        self.newest_applied = Some(request_id);
        true
    }
}

/// Issue one fetch on `handle` and deliver the outcome to `tx`.
pub fn spawn_fetch(
    handle: &Handle,
    client: FeedClient,
    ids: &RequestIds,
    tx: UnboundedSender<FeedUpdate>,
) -> u64 {
    let request_id = ids.next();
    handle.spawn(async move {
        let result = client.fetch().await;
        // Receiver gone means the UI has exited.
        let _ = tx.send(FeedUpdate { request_id, result });
    });
    request_id
}

/// Repeating timer that fires a fetch every `period`, forever. Aborted on drop.
#[derive(Debug)]
pub struct RefreshScheduler {
    task: JoinHandle<()>,
}

impl RefreshScheduler {
    pub fn start(
        handle: &Handle,
        client: FeedClient,
        ids: RequestIds,
        period: Duration,
        tx: UnboundedSender<FeedUpdate>,
    ) -> Self {
        let spawn_on = handle.clone();
        let task = handle.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }
                // Ticks do not wait for earlier fetches to finish.
                let id = spawn_fetch(&spawn_on, client.clone(), &ids, tx.clone());
                log::debug!("Scheduled refresh #{id}");
            }
        });
        log::info!("Auto-refresh every {}s", period.as_secs());
        Self { task }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Holds the one scheduler a session may have.
#[derive(Debug, Default)]
pub struct SchedulerSlot {
    active: Option<RefreshScheduler>,
}

impl SchedulerSlot {
    /// Start the scheduler unless one is already running. Returns whether it started one.
    pub fn ensure_started(&mut self, start: impl FnOnce() -> RefreshScheduler) -> bool {
        if self.active.is_some() {
            return false;
        }
        self.active = Some(start());
        true
    }
}
