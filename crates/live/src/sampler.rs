use std::{sync::Arc, time::Duration};

use common::{FetchError, FetchResponse, LedgerSource};
use log::{debug, info, warn};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;

use crate::state::{LedgerState, LiveSnapshot};

pub const POLL_INTERVAL: Duration = Duration::from_millis(3_000);
pub const FETCH_LIMIT: u32 = 25;

/// polls a `LedgerSource` and keeps a rolling view of recent transactions
/// and network throughput. every completed cycle, failed or not, publishes
/// a fresh `LiveSnapshot` to subscribers.
pub struct LiveLedgerSampler {
    source: Arc<dyn LedgerSource>,
    state: LedgerState,
    publisher: watch::Sender<Arc<LiveSnapshot>>,
    poll_interval: Duration,
    fetch_limit: u32,
    // tps samples are timed against this, never the wall clock
    started: Instant,
}

impl LiveLedgerSampler {
    pub fn new(source: Arc<dyn LedgerSource>) -> Self {
        let (publisher, _) = watch::channel(Arc::new(LiveSnapshot::default()));
        LiveLedgerSampler {
            source,
            state: LedgerState::default(),
            publisher,
            poll_interval: POLL_INTERVAL,
            fetch_limit: FETCH_LIMIT,
            started: Instant::now(),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<LiveSnapshot>> {
        self.publisher.subscribe()
    }

    pub fn snapshot(&self) -> Arc<LiveSnapshot> {
        self.publisher.borrow().clone()
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// runs a single fetch-and-merge cycle
    pub async fn fetch_cycle(&mut self) {
        let outcome = self.fetch().await;
        self.apply(outcome);
    }

    /// feeds a ledger version straight into the tps window and republishes
    pub fn update_tps(&mut self, current_version: &str) {
        let now = self.now_millis();
        self.state.update_tps(current_version, now);
        self.publish();
    }

    /// spawns the poll loop: one cycle right away, then one per tick
    pub fn start(self) -> SamplerHandle {
        let token = CancellationToken::new();
        let snapshots = self.subscribe();
        let task = tokio::spawn(self.run(token.clone()));
        SamplerHandle {
            token,
            task: Some(task),
            snapshots,
        }
    }

    async fn run(mut self, token: CancellationToken) {
        info!(
            "live sampler started (interval={}ms, limit={})",
            self.poll_interval.as_millis(),
            self.fetch_limit
        );
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                outcome = self.fetch() => outcome,
            };
            // a result that lands after stop() is dropped on the floor
            if token.is_cancelled() {
                break;
            }
            self.apply(outcome);
        }
        info!(
            "live sampler stopped at version {}",
            self.state.last_seen_version()
        );
    }

    async fn fetch(&self) -> Result<FetchResponse, FetchError> {
        let source = self.source.clone();
        let limit = self.fetch_limit;
        match tokio::task::spawn_blocking(move || source.fetch(limit)).await {
            Ok(outcome) => outcome,
            Err(err) => Err(FetchError::Transport(format!("fetch task failed: {err}"))),
        }
    }

    fn apply(&mut self, outcome: Result<FetchResponse, FetchError>) {
        let now = self.now_millis();
        let fresh = self.state.apply(outcome, now);
        match self.state.error() {
            Some(err) => warn!("live fetch cycle failed: {err}"),
            None => debug!(
                "live fetch cycle ok: {fresh} new transactions, last_seen={} tps={}",
                self.state.last_seen_version(),
                self.state.stats().tps
            ),
        }
        self.publish();
    }

    fn now_millis(&self) -> i64 {
        self.started.elapsed().as_millis() as i64
    }

    fn publish(&self) {
        self.publisher.send_replace(Arc::new(self.state.snapshot()));
    }
}

/// handle to a running sampler. dropping it cancels the poll loop; `stop`
/// additionally waits for the loop to exit.
pub struct SamplerHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
    snapshots: watch::Receiver<Arc<LiveSnapshot>>,
}

impl SamplerHandle {
    pub fn subscribe(&self) -> watch::Receiver<Arc<LiveSnapshot>> {
        self.snapshots.clone()
    }

    /// the last published snapshot, still readable after `stop`
    pub fn snapshot(&self) -> Arc<LiveSnapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// cancels polling. once this returns the sampler will not fetch or
    /// publish again, even if a fetch was in flight.
    pub async fn stop(&mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!("live sampler task ended abnormally: {err}");
            }
        }
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
