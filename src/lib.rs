//! Mini Cache - An in-memory key-value cache server
//!
//! Provides Redis-like functionality with TTL expiration, LRU eviction and
//! crash-safe snapshot persistence.

pub mod cache;
pub mod config;
pub mod error;
pub mod server;
pub mod tasks;

pub use cache::{CacheStore, SnapshotStore, Ttl};
pub use config::Config;
pub use error::{CacheError, Result};
pub use server::{serve, CommandParser};
pub use tasks::{spawn_snapshot_task, TtlSweeper};
