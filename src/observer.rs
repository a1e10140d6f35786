use std::sync::Arc;

use crate::error::WindowFetchError;
use crate::models::Snapshot;
use crate::numeric::BlockNumber;

#[derive(Debug, Clone)]
pub enum DashboardEvent {
    /// A new snapshot replaced the previous one.
    Published(Arc<Snapshot>),
    /// A cycle failed and was discarded; the previous snapshot is still current.
    CycleAborted {
        latest: BlockNumber,
        error: WindowFetchError,
    },
}

/// Subscriber notified on every coordinator outcome.
///
/// Called synchronously on the coordinator's task, in publication order.
/// Implementations should return quickly.
pub trait SnapshotObserver: Send + Sync {
    fn on_event(&self, event: &DashboardEvent);
}

/// Forwards events to an unbounded channel for async consumers.
#[derive(Debug)]
pub struct ChannelObserver {
    tx: tokio::sync::mpsc::UnboundedSender<DashboardEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<DashboardEvent>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SnapshotObserver for ChannelObserver {
    fn on_event(&self, event: &DashboardEvent) {
        // receiver may be gone
        let _ = self.tx.send(event.clone());
    }
}

/// Logs each event via tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl SnapshotObserver for LoggingObserver {
    fn on_event(&self, event: &DashboardEvent) {
        match event {
            DashboardEvent::Published(snapshot) => {
                tracing::info!(
                    chain = %snapshot.chain_label,
                    latest = %snapshot.latest_block_number,
                    blocks = snapshot.window.confirmed().len(),
                    pending = snapshot.window.pending().is_some(),
                    avg_txs = snapshot.statistics.average_transactions_per_block,
                    avg_gas_price_gwei = snapshot.statistics.average_gas_price_gwei(),
                    "snapshot published"
                );
            }
            DashboardEvent::CycleAborted { latest, error } => {
                tracing::error!(latest = %latest, error = %error, "window cycle aborted");
            }
        }
    }
}
