//! Process-wide snapshot store with change notification.

use std::sync::Arc;

use blockwatch_types::Snapshot;
use parking_lot::RwLock;
use tokio::sync::watch;

/// Holds the latest published [`Snapshot`] for concurrent readers.
///
/// Publishing swaps a whole `Arc<Snapshot>`, so a reader always sees one
/// complete version, never a mix of old and new fields. Subscribers get a
/// watch channel that yields each newly published version.
///
/// # Example
///
/// ```rust
/// use blockwatch_monitor::{Snapshot, SnapshotStore};
///
/// # tokio_test::block_on(async {
/// let store = SnapshotStore::new();
/// let mut updates = store.subscribe();
///
/// let mut next = Snapshot::initial();
/// next.version = 1;
/// store.publish(next);
///
/// updates.changed().await.unwrap();
/// assert_eq!(updates.borrow().version, 1);
/// # });
/// ```
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
    notify: watch::Sender<Arc<Snapshot>>,
}

impl SnapshotStore {
    /// Create a store holding the initial placeholder snapshot.
    pub fn new() -> Self {
        let initial = Arc::new(Snapshot::initial());
        let (notify, _) = watch::channel(initial.clone());
        Self {
            current: RwLock::new(initial),
            notify,
        }
    }

    /// The latest published snapshot. Non-blocking and safe to call from
    /// any thread at any time.
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }

    /// Publish a new version and notify subscribers.
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write() = snapshot.clone();
        // Subscribers may have gone away; that is not an error.
        let _ = self.notify.send(snapshot.clone());
        snapshot
    }

    /// Subscribe to published versions. The receiver immediately holds the
    /// current snapshot and is marked changed on every publish.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.notify.subscribe()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockwatch_types::BlockingState;

    #[test]
    fn starts_with_initial_snapshot() {
        let store = SnapshotStore::new();
        let current = store.current();
        assert_eq!(current.version, 0);
        assert!(!current.is_initialized());
    }

    #[test]
    fn publish_replaces_current() {
        let store = SnapshotStore::new();

        let mut snapshot = Snapshot::initial();
        snapshot.version = 1;
        snapshot.blocking = BlockingState::disabled(["ads"]);
        store.publish(snapshot);

        let current = store.current();
        assert_eq!(current.version, 1);
        assert_eq!(current.blocking, BlockingState::disabled(["ads"]));
    }

    #[test]
    fn readers_hold_their_version_across_publishes() {
        let store = SnapshotStore::new();
        let before = store.current();

        let mut snapshot = Snapshot::initial();
        snapshot.version = 1;
        store.publish(snapshot);

        // The old Arc is unchanged; only the store moved on.
        assert_eq!(before.version, 0);
        assert_eq!(store.current().version, 1);
    }

    #[tokio::test]
    async fn subscribers_see_each_publish() {
        let store = SnapshotStore::new();
        let mut rx = store.subscribe();

        let mut snapshot = Snapshot::initial();
        snapshot.version = 1;
        store.publish(snapshot);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().version, 1);
    }

    #[test]
    fn concurrent_reads_see_complete_snapshots() {
        use std::thread;

        let store = Arc::new(SnapshotStore::new());
        let writer = {
            let store = store.clone();
            thread::spawn(move || {
                for version in 1..=100u64 {
                    let mut snapshot = Snapshot::initial();
                    snapshot.version = version;
                    snapshot.last_success_ms = Some(version * 1000);
                    store.publish(snapshot);
                }
            })
        };

        let reader = {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..1000 {
                    let snapshot = store.current();
                    // Fields published together stay together.
                    if let Some(ms) = snapshot.last_success_ms {
                        assert_eq!(ms, snapshot.version * 1000);
                    } else {
                        assert_eq!(snapshot.version, 0);
                    }
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
    }
}
