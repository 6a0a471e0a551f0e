//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror. A missing or expired key
//! is never an error: reads return `Option` and TTL lookups return a
//! three-way result instead.

use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A constructor or configuration value is out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Snapshot file could not be read, written or renamed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot file exists but cannot be decoded
    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    /// Expiring a single key failed during a sweep cycle
    #[error("Sweep failed for key {key}: {reason}")]
    Sweep { key: String, reason: String },
}

impl CacheError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::CorruptSnapshot(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::InvalidArgument("capacity must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid argument: capacity must be positive");

        let err = CacheError::Sweep {
            key: "k1".to_string(),
            reason: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Sweep failed for key k1: boom");
    }

    #[test]
    fn test_io_error_keeps_path_and_source() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = CacheError::io("/tmp/snap.json", source);

        assert!(err.to_string().contains("/tmp/snap.json"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_json_error_is_corrupt_snapshot() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: CacheError = json_err.into();
        assert!(matches!(err, CacheError::CorruptSnapshot(_)));
    }
}
