//! Snapshot Persistence Module
//!
//! Saves a consistent copy of the cache to disk and restores it on startup.
//!
//! The file is a versioned JSON document holding every entry with its
//! absolute deadline plus the recency order, oldest first. Saves go to a
//! sibling `.tmp` file that is fsynced and renamed over the target, so a
//! crash mid-save never leaves a half-written snapshot behind. Saves from
//! different callers are serialized so they never share the temp file. A snapshot
//! that cannot be decoded is renamed to `<path>.corrupted.<unix millis>` and
//! the cache starts empty.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheStore, SnapshotData};
use crate::error::{CacheError, Result};

/// Current on-disk format version.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    #[serde(flatten)]
    data: SnapshotData,
}

// == Load Outcome ==
/// What `SnapshotStore::load` did with the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No snapshot file; store left untouched
    Missing,
    /// Snapshot restored with this many entries
    Restored(usize),
    /// File was unreadable; holds the quarantine path if the rename worked
    Quarantined(Option<PathBuf>),
}

// == Snapshot Store ==
/// Persists a `CacheStore` to a single snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    store: Arc<CacheStore>,
    path: PathBuf,
    /// Held for the whole extract-write-rename sequence of one save
    save_lock: Arc<Mutex<()>>,
}

impl SnapshotStore {
    pub fn new(store: Arc<CacheStore>, path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            path: path.into(),
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // == Save ==
    /// Writes the current store contents to the snapshot file.
    ///
    /// Failures are logged and leave any previous snapshot untouched.
    /// Returns whether the snapshot was written.
    pub fn save(&self) -> bool {
        match self.try_save() {
            Ok(count) => {
                info!(path = %self.path.display(), keys = count, "Snapshot saved");
                true
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Snapshot save failed");
                false
            }
        }
    }

    fn try_save(&self) -> Result<usize> {
        let _guard = self.save_lock.lock();

        // Store lock is only held while copying; file I/O runs on the copy
        let data = self.store.extract_snapshot();
        let count = data.entries.len();

        let file = SnapshotFile {
            version: SNAPSHOT_FORMAT_VERSION,
            data,
        };
        let bytes = serde_json::to_vec(&file)?;

        let tmp = sibling_path(&self.path, ".tmp");
        if let Err(e) = write_and_sync(&tmp, &bytes).and_then(|_| fs::rename(&tmp, &self.path)) {
            let _ = fs::remove_file(&tmp);
            return Err(CacheError::io(&self.path, e));
        }
        if let Err(e) = sync_parent_dir(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to sync snapshot directory");
        }

        Ok(count)
    }

    // == Load ==
    /// Restores the store from the snapshot file, replacing its state.
    ///
    /// A missing file is not an error. An unreadable file is quarantined and
    /// the store is left as it was.
    pub fn load(&self) -> LoadOutcome {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No snapshot file, starting with empty cache");
            return LoadOutcome::Missing;
        }

        match self.read_snapshot() {
            Ok(data) => {
                let count = data.entries.len();
                self.store.restore_from_snapshot(data);
                info!(path = %self.path.display(), keys = count, "Snapshot loaded");
                LoadOutcome::Restored(count)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Snapshot load failed");
                LoadOutcome::Quarantined(self.quarantine())
            }
        }
    }

    fn read_snapshot(&self) -> Result<SnapshotData> {
        let bytes = fs::read(&self.path).map_err(|e| CacheError::io(&self.path, e))?;
        let file: SnapshotFile = serde_json::from_slice(&bytes)?;

        if file.version != SNAPSHOT_FORMAT_VERSION {
            return Err(CacheError::CorruptSnapshot(format!(
                "unsupported snapshot version {}",
                file.version
            )));
        }
        Ok(file.data)
    }

    fn quarantine(&self) -> Option<PathBuf> {
        let target = quarantine_path(&self.path, current_timestamp_ms());

        match fs::rename(&self.path, &target) {
            Ok(()) => {
                warn!(from = %self.path.display(), to = %target.display(), "Renamed corrupted snapshot");
                Some(target)
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to rename corrupted snapshot");
                None
            }
        }
    }
}

/// Returns `<path>.corrupted.<unix_millis>`.
pub fn quarantine_path(path: &Path, unix_millis: i64) -> PathBuf {
    sibling_path(path, &format!(".corrupted.{unix_millis}"))
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Makes the rename durable by flushing the directory entry.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    File::open(parent)?.sync_all()
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
