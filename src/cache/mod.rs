//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, LRU eviction and snapshot
//! persistence.

pub(crate) mod entry;
mod lru;
mod snapshot;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use snapshot::{quarantine_path, LoadOutcome, SnapshotStore, SNAPSHOT_FORMAT_VERSION};
pub use stats::{CacheStats, StatsRecorder};
pub use store::{CacheStore, SnapshotData, Ttl};
