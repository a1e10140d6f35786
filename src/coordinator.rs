use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    client::ChainClient,
    cycle_stats::{CycleCounters, CycleCountersSnapshot},
    models::Snapshot,
    numeric::BlockNumber,
    observer::{DashboardEvent, SnapshotObserver},
    stats::Statistics,
    window::{WindowBuilder, DEFAULT_WINDOW_SIZE},
};

pub const DEFAULT_CHAIN_LABEL: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    Idle,
    FetchingWindow,
    Aggregating,
    Published,
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub window_size: u64,
    /// Label used until the chain reports its own.
    pub default_chain_label: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            default_chain_label: DEFAULT_CHAIN_LABEL.to_string(),
        }
    }
}

/// Turns block-number notifications into published snapshots.
///
/// One window cycle runs at a time. Notifications arriving during a cycle
/// overwrite a single "latest requested" cell; when the cycle ends, at most
/// one follow-up cycle runs with the freshest value.
pub struct StreamCoordinator<C> {
    builder: WindowBuilder<C>,
    requested: watch::Receiver<Option<BlockNumber>>,
    label: watch::Receiver<String>,
    snapshot: watch::Sender<Option<Arc<Snapshot>>>,
    state: watch::Sender<CycleState>,
    /// Head of the last aborted cycle, cleared when the next cycle starts.
    failed: watch::Sender<Option<BlockNumber>>,
    counters: Arc<CycleCounters>,
    observers: Vec<Arc<dyn SnapshotObserver>>,
}

/// Cloneable access to a running coordinator.
///
/// The coordinator stops once every handle has been dropped.
#[derive(Clone)]
pub struct CoordinatorHandle {
    requested: Arc<watch::Sender<Option<BlockNumber>>>,
    label: Arc<watch::Sender<String>>,
    snapshot: watch::Receiver<Option<Arc<Snapshot>>>,
    state: watch::Receiver<CycleState>,
    failed: watch::Receiver<Option<BlockNumber>>,
    counters: Arc<CycleCounters>,
}

impl<C: ChainClient> StreamCoordinator<C> {
    pub fn new(client: Arc<C>, config: CoordinatorConfig) -> (Self, CoordinatorHandle) {
        let (requested_tx, requested_rx) = watch::channel(None);
        let (label_tx, label_rx) = watch::channel(config.default_chain_label);
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let (state_tx, state_rx) = watch::channel(CycleState::Idle);
        let (failed_tx, failed_rx) = watch::channel(None);
        let counters = Arc::new(CycleCounters::new());

        let coordinator = Self {
            builder: WindowBuilder::new(client, config.window_size),
            requested: requested_rx,
            label: label_rx,
            snapshot: snapshot_tx,
            state: state_tx,
            failed: failed_tx,
            counters: Arc::clone(&counters),
            observers: Vec::new(),
        };
        let handle = CoordinatorHandle {
            requested: Arc::new(requested_tx),
            label: Arc::new(label_tx),
            snapshot: snapshot_rx,
            state: state_rx,
            failed: failed_rx,
            counters,
        };
        (coordinator, handle)
    }

    pub fn with_observer(mut self, observer: Arc<dyn SnapshotObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub async fn run(mut self) {
        info!(window_size = self.builder.size(), "stream coordinator started");

        while self.requested.changed().await.is_ok() {
            let latest = self.requested.borrow_and_update().clone();
            let Some(latest) = latest else {
                continue;
            };
            self.run_cycle(latest).await;
        }

        info!("all coordinator handles dropped, stopping");
    }

    async fn run_cycle(&self, latest: BlockNumber) {
        self.counters.inc_cycles_started();
        self.failed.send_replace(None);
        self.state.send_replace(CycleState::FetchingWindow);
        debug!(latest = %latest, "window cycle started");

        match self.builder.build_window(&latest).await {
            Ok(window) => {
                self.state.send_replace(CycleState::Aggregating);
                let statistics = Statistics::aggregate(window.confirmed());
                let chain_label = self.label.borrow().clone();
                let snapshot = Arc::new(Snapshot {
                    chain_label,
                    latest_block_number: latest,
                    window,
                    statistics,
                });

                self.snapshot.send_replace(Some(Arc::clone(&snapshot)));
                self.counters.inc_cycles_published();
                self.state.send_replace(CycleState::Published);
                self.emit(&DashboardEvent::Published(snapshot));
            }
            Err(error) => {
                warn!(
                    latest = %latest,
                    error = %error,
                    cause = %error.source,
                    "window cycle failed, keeping previous snapshot"
                );
                self.counters.inc_cycles_aborted();
                self.failed.send_replace(Some(latest.clone()));
                self.emit(&DashboardEvent::CycleAborted { latest, error });
            }
        }

        self.state.send_replace(CycleState::Idle);
    }

    fn emit(&self, event: &DashboardEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

impl CoordinatorHandle {
    /// Records a new chain head. Returns `false` for a repeat of the
    /// currently requested number, which does not trigger a cycle, unless
    /// the last cycle for that number was aborted.
    pub fn notify(&self, number: BlockNumber) -> bool {
        self.counters.inc_notifications();
        let retry = self.failed.borrow().as_ref() == Some(&number);
        let accepted = self.requested.send_if_modified(|current| {
            if current.as_ref() == Some(&number) && !retry {
                false
            } else {
                *current = Some(number.clone());
                true
            }
        });
        if !accepted {
            self.counters.inc_duplicates();
            debug!(number = %number, "duplicate block notification");
        }
        accepted
    }

    /// Stores the chain label for subsequent snapshots. Empty labels are
    /// ignored so a known label is never replaced by a blank one.
    pub fn set_chain_label(&self, label: impl Into<String>) -> bool {
        let label = label.into();
        if label.trim().is_empty() {
            return false;
        }
        self.label.send_replace(label);
        true
    }

    pub fn chain_label(&self) -> String {
        self.label.borrow().clone()
    }

    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.snapshot.clone()
    }

    pub fn state(&self) -> CycleState {
        *self.state.borrow()
    }

    pub fn counters(&self) -> CycleCountersSnapshot {
        self.counters.snapshot()
    }
}

/// Pumps a block-number stream into the coordinator until it ends.
pub async fn forward_feed<S>(feed: S, handle: &CoordinatorHandle)
where
    S: Stream<Item = BlockNumber>,
{
    futures_util::pin_mut!(feed);
    let mut highest: Option<BlockNumber> = None;

    while let Some(number) = feed.next().await {
        let regressed = highest.as_ref().is_some_and(|prev| &number < prev);
        if regressed {
            debug!(number = %number, previous = ?highest, "chain head regressed");
        } else {
            highest = Some(number.clone());
        }
        handle.notify(number);
    }

    warn!("block number feed ended");
}

/// Resolves the chain label once. Failure leaves the default label in place.
pub async fn load_chain_label<C>(client: &C, handle: &CoordinatorHandle)
where
    C: ChainClient + ?Sized,
{
    match client.chain_label().await {
        Ok(label) => {
            info!(chain = %label, "chain label resolved");
            handle.set_chain_label(label);
        }
        Err(err) => warn!(error = %err, "failed to resolve chain label"),
    }
}
