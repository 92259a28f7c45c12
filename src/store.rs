use crate::snapshot::Snapshot;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Single-slot holder of the latest snapshot, shared between the scheduler
/// and every HTTP handler.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    latest: Arc<RwLock<Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot. The zero-valued snapshot until the first cycle lands.
    pub async fn read(&self) -> Arc<Snapshot> {
        self.latest.read().await.clone()
    }

    /// Replace the current snapshot wholesale.
    pub async fn write(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        *self.latest.write().await = snapshot.clone();
        snapshot
    }
}
