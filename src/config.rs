//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Background TTL sweep interval in milliseconds
    pub sweep_interval_ms: u64,
    /// Snapshot file location
    pub snapshot_path: PathBuf,
    /// Periodic snapshot interval in seconds, 0 disables periodic saves
    pub snapshot_interval_secs: u64,
    /// Address the TCP listener binds to
    pub server_host: String,
    /// TCP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// Values that fail to parse fall back to their default.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `SWEEP_INTERVAL_MS` - TTL sweep frequency in milliseconds (default: 1000)
    /// - `SNAPSHOT_PATH` - Snapshot file (default: cache_snapshot.json)
    /// - `SNAPSHOT_INTERVAL_SECS` - Snapshot frequency in seconds (default: 60)
    /// - `SERVER_HOST` - Bind address (default: 0.0.0.0)
    /// - `SERVER_PORT` - TCP server port (default: 6379)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            capacity: env_or("CACHE_CAPACITY", defaults.capacity),
            sweep_interval_ms: env_or("SWEEP_INTERVAL_MS", defaults.sweep_interval_ms),
            snapshot_path: env::var("SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_path),
            snapshot_interval_secs: env_or("SNAPSHOT_INTERVAL_SECS", defaults.snapshot_interval_secs),
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }

    /// Rejects values the cache components cannot be built with.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidArgument(
                "CACHE_CAPACITY must be positive".to_string(),
            ));
        }
        if self.sweep_interval_ms == 0 {
            return Err(CacheError::InvalidArgument(
                "SWEEP_INTERVAL_MS must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Periodic snapshot interval, or None when disabled.
    pub fn snapshot_interval(&self) -> Option<Duration> {
        (self.snapshot_interval_secs > 0).then(|| Duration::from_secs(self.snapshot_interval_secs))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 1000,
            sweep_interval_ms: 1000,
            snapshot_path: PathBuf::from("cache_snapshot.json"),
            snapshot_interval_secs: 60,
            server_host: "0.0.0.0".to_string(),
            server_port: 6379,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
