//! Periodic Snapshot Task
//!
//! Background task that saves the cache to its snapshot file at a fixed
//! interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::SnapshotStore;

/// Spawns a background task that periodically saves a snapshot.
///
/// Each save runs on the blocking thread pool so file I/O never stalls the
/// runtime. The first save happens one interval after spawning.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let snapshots = Arc::new(SnapshotStore::new(store, "cache_snapshot.json"));
/// let snapshot_handle = spawn_snapshot_task(snapshots, Duration::from_secs(60));
/// // Later, during shutdown:
/// snapshot_handle.abort();
/// ```
pub fn spawn_snapshot_task(snapshots: Arc<SnapshotStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            interval_secs = interval.as_secs(),
            path = %snapshots.path().display(),
            "Starting periodic snapshot task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let snapshots = Arc::clone(&snapshots);
            if let Err(e) = tokio::task::spawn_blocking(move || snapshots.save()).await {
                warn!(error = %e, "Periodic snapshot task panicked");
            }
        }
    })
}
