//! Command queue and the user-facing monitor handle.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use blockwatch_client::{ControlError, QueryResponse};
use blockwatch_types::Snapshot;
use tokio::sync::{mpsc, oneshot, watch};

use crate::store::SnapshotStore;

/// A control command queued for the reconciliation loop.
///
/// Commands are applied by the loop itself, never interleaved with an
/// in-flight cycle, so the timer state machine has a single writer.
pub(crate) enum Command {
    Enable {
        reply: oneshot::Sender<Result<(), ControlError>>,
    },
    Disable {
        groups: BTreeSet<String>,
        duration: Option<Duration>,
        reply: oneshot::Sender<Result<(), ControlError>>,
    },
    RefreshLists {
        reply: oneshot::Sender<Result<(), ControlError>>,
    },
    FlushCache {
        reply: oneshot::Sender<Result<(), ControlError>>,
    },
    Query {
        name: String,
        qtype: String,
        reply: oneshot::Sender<Result<QueryResponse, ControlError>>,
    },
}

/// Handle for reading snapshots and issuing control commands.
///
/// Obtained from [`Monitor::start`](crate::Monitor::start). Cloneable; the
/// loop keeps polling until [`stop`](MonitorHandle::stop) is called or every
/// handle has been dropped.
#[derive(Clone)]
pub struct MonitorHandle {
    commands: mpsc::Sender<Command>,
    store: Arc<SnapshotStore>,
    stop: Arc<watch::Sender<bool>>,
}

impl MonitorHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        store: Arc<SnapshotStore>,
        stop: Arc<watch::Sender<bool>>,
    ) -> Self {
        Self {
            commands,
            store,
            stop,
        }
    }

    /// The latest published snapshot. Never blocks.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.current()
    }

    /// Subscribe to snapshot publishes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.store.subscribe()
    }

    /// Enable blocking. A no-op on the published state if already enabled.
    pub async fn enable(&self) -> Result<(), ControlError> {
        self.roundtrip(|reply| Command::Enable { reply }).await
    }

    /// Disable all blocking for a bounded duration; blocking re-enables
    /// itself once the duration elapses.
    pub async fn disable_for(&self, duration: Duration) -> Result<(), ControlError> {
        self.roundtrip(|reply| Command::Disable {
            groups: BTreeSet::new(),
            duration: Some(duration),
            reply,
        })
        .await
    }

    /// Disable blocking for specific groups, indefinitely or for a bounded
    /// duration. An empty group set disables all blocking.
    pub async fn disable_groups(
        &self,
        groups: BTreeSet<String>,
        duration: Option<Duration>,
    ) -> Result<(), ControlError> {
        self.roundtrip(|reply| Command::Disable {
            groups,
            duration,
            reply,
        })
        .await
    }

    /// Trigger a refresh of all blocking lists.
    pub async fn refresh_lists(&self) -> Result<(), ControlError> {
        self.roundtrip(|reply| Command::RefreshLists { reply }).await
    }

    /// Flush the server's DNS cache.
    pub async fn flush_cache(&self) -> Result<(), ControlError> {
        self.roundtrip(|reply| Command::FlushCache { reply }).await
    }

    /// Resolve a name through the filter, reporting how it is handled.
    pub async fn query(&self, name: &str, qtype: &str) -> Result<QueryResponse, ControlError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Query {
                name: name.to_string(),
                qtype: qtype.to_string(),
                reply: tx,
            })
            .await
            .map_err(|_| loop_stopped())?;
        rx.await.map_err(|_| loop_stopped())?
    }

    /// Stop the reconciliation loop. In-flight requests are abandoned once
    /// their own timeout elapses.
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    async fn roundtrip<F>(&self, make: F) -> Result<(), ControlError>
    where
        F: FnOnce(oneshot::Sender<Result<(), ControlError>>) -> Command,
    {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| loop_stopped())?;
        rx.await.map_err(|_| loop_stopped())?
    }
}

impl std::fmt::Debug for MonitorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorHandle")
            .field("snapshot_version", &self.store.current().version)
            .finish()
    }
}

fn loop_stopped() -> ControlError {
    ControlError::Unexpected("monitor loop is not running".to_string())
}
