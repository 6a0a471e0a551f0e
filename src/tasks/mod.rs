//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - TTL Sweeper: Removes expired cache entries at a fixed interval
//! - Snapshot: Persists the cache to disk at a fixed interval

mod snapshot;
mod sweeper;

pub use snapshot::spawn_snapshot_task;
pub use sweeper::{sweep_once, ExpirySource, SweepReport, TtlSweeper};
