//! Integration Tests for Snapshot Persistence
//!
//! Exercises save/load through the public API, including restarts with a
//! running sweeper and corrupted snapshot files.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mini_cache::cache::LoadOutcome;
use mini_cache::{CacheStore, SnapshotStore, Ttl, TtlSweeper};

const CAPACITY: usize = 3;

fn open(path: &Path) -> (Arc<CacheStore>, SnapshotStore) {
    let store = Arc::new(CacheStore::new(CAPACITY).unwrap());
    let snapshots = SnapshotStore::new(Arc::clone(&store), path);
    (store, snapshots)
}

#[test]
fn test_custom_snapshot_file_path() {
    let dir = tempfile::tempdir().unwrap();
    let custom = dir.path().join("custom_test_snapshot.dat");
    let (store, snapshots) = open(&custom);

    store.set("key", "value", None);
    assert!(snapshots.save());

    assert!(custom.exists());
    assert!(!dir.path().join("cache_snapshot.json").exists());

    let (restored, restored_snapshots) = open(&custom);
    assert_eq!(restored_snapshots.load(), LoadOutcome::Restored(1));
    assert_eq!(restored.get("key").as_deref(), Some("value"));
}

#[test]
fn test_save_overwrites_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache_snapshot.json");
    let (store, snapshots) = open(&path);

    store.set("first", "1", None);
    assert!(snapshots.save());
    store.delete("first");
    store.set("second", "2", None);
    assert!(snapshots.save());

    let (restored, restored_snapshots) = open(&path);
    restored_snapshots.load();
    assert!(!restored.exists("first"));
    assert!(restored.exists("second"));
}

#[test]
fn test_corrupted_snapshot_recovery() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache_snapshot.json");
    fs::write(&path, "This is corrupted data").unwrap();

    let (store, snapshots) = open(&path);
    let outcome = snapshots.load();

    assert!(store.is_empty());
    assert!(!path.exists());

    let quarantined: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|entry| entry.unwrap().file_name().into_string().ok())
        .filter(|name| name.starts_with("cache_snapshot.json.corrupted."))
        .collect();
    assert_eq!(quarantined.len(), 1);

    let suffix = quarantined[0].trim_start_matches("cache_snapshot.json.corrupted.");
    assert!(suffix.parse::<i64>().is_ok(), "suffix should be unix millis");
    assert_eq!(
        outcome,
        LoadOutcome::Quarantined(Some(dir.path().join(&quarantined[0])))
    );

    // Store stays usable after recovery
    store.set("fresh", "start", None);
    assert!(snapshots.save());
    assert!(path.exists());
}

#[tokio::test]
async fn test_ttl_survives_restart_and_is_swept() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache_snapshot.json");

    let (original, snapshots) = open(&path);
    let mut sweeper = TtlSweeper::new(Arc::clone(&original), Duration::from_millis(200)).unwrap();
    sweeper.start();

    original.set("TTL_KEY", "Expire soon", Some(Duration::from_millis(2000)));
    tokio::time::sleep(Duration::from_millis(500)).await;
    sweeper.stop();
    assert!(snapshots.save());

    let (restored, restored_snapshots) = open(&path);
    restored_snapshots.load();
    let mut sweeper = TtlSweeper::new(Arc::clone(&restored), Duration::from_millis(200)).unwrap();
    sweeper.start();

    assert!(restored.exists("TTL_KEY"));
    match restored.remaining_ttl("TTL_KEY") {
        Ttl::Remaining(left) => {
            assert!(left > Duration::from_millis(500));
            // Deadline is absolute, not restarted by the reload
            assert!(left <= Duration::from_millis(1500));
        }
        other => panic!("unexpected ttl {other:?}"),
    }

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(restored.is_empty(), "sweeper should have expired the restored key");
    assert!(!restored.exists("TTL_KEY"));
    sweeper.stop();
}
