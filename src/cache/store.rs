//! Cache Store Module
//!
//! Main cache engine combining concurrent map storage with LRU tracking and
//! TTL expiration.
//!
//! # Locking
//! Reads go straight to the `DashMap`. Every path that changes the key set
//! (insert, delete, expiry, eviction, restore) does so while holding the
//! recency mutex, so the entry map and the recency order always describe the
//! same set of keys. The mutex is always taken before any map shard lock and
//! no map guard is held while waiting for it.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{CacheEntry, CacheStats, LruTracker, StatsRecorder};
use crate::error::{CacheError, Result};

// == Remaining TTL ==
/// Result of a TTL lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Key absent or already expired
    NotFound,
    /// Key present without an expiration
    NoExpiry,
    /// Key present, expires after the given duration
    Remaining(Duration),
}

// == Snapshot Data ==
/// Consistent copy of the store: entries plus recency order, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotData {
    pub entries: HashMap<String, CacheEntry>,
    pub order: Vec<String>,
}

// == Cache Store ==
/// Main cache storage with LRU eviction and TTL support.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: DashMap<String, CacheEntry>,
    /// LRU access tracker, also serializes key-set mutations
    lru: Mutex<LruTracker>,
    /// Performance statistics
    stats: StatsRecorder,
    /// Maximum number of entries allowed
    capacity: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore holding at most `capacity` entries.
    ///
    /// # Errors
    /// `InvalidArgument` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidArgument(
                "capacity must be positive".to_string(),
            ));
        }

        Ok(Self {
            entries: DashMap::new(),
            lru: Mutex::new(LruTracker::new(capacity)),
            stats: StatsRecorder::new(),
            capacity,
        })
    }

    // == Set ==
    /// Stores a key-value pair with optional TTL.
    ///
    /// If the key already exists, the entry is replaced wholesale and its TTL
    /// recomputed. The key becomes most recently used. Inserting past
    /// capacity evicts the least recently used key before returning.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>, ttl: Option<Duration>) {
        let key = key.into();
        let entry = CacheEntry::new(value.into(), ttl);

        let mut lru = self.lru.lock();
        self.entries.insert(key.clone(), entry);
        lru.record_access(&key);

        while let Some(victim) = lru.eviction_candidate().map(str::to_owned) {
            lru.remove(&victim);
            self.entries.remove(&victim);
            self.stats.record_eviction();
            debug!(key = %victim, "LRU evicted key");
        }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Expired entries are removed on the spot and reported as absent. A hit
    /// marks the key as most recently used.
    pub fn get(&self, key: &str) -> Option<String> {
        let lookup = self
            .entries
            .get(key)
            .map(|entry| (entry.is_expired(), entry.value.clone()));

        match lookup {
            None => {
                self.stats.record_miss();
                None
            }
            Some((true, _)) => {
                self.expire_if_stale(key);
                self.stats.record_miss();
                None
            }
            Some((false, value)) => {
                let mut lru = self.lru.lock();
                // A concurrent delete may have won the race since the lookup
                if self.entries.contains_key(key) {
                    lru.record_access(key);
                }
                drop(lru);

                self.stats.record_hit();
                Some(value)
            }
        }
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether an entry was removed.
    pub fn delete(&self, key: &str) -> bool {
        let mut lru = self.lru.lock();
        let removed = self.entries.remove(key).is_some();
        lru.remove(key);
        removed
    }

    // == Exists ==
    /// Returns whether a live entry exists, with the same lazy expiry as `get`.
    pub fn exists(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    // == Remaining TTL ==
    /// Returns how long the key has left to live.
    ///
    /// Does not count as an access for LRU purposes.
    pub fn remaining_ttl(&self, key: &str) -> Ttl {
        let lookup = self
            .entries
            .get(key)
            .map(|entry| (entry.is_expired(), entry.remaining_ttl()));

        match lookup {
            None => Ttl::NotFound,
            Some((true, _)) => {
                self.expire_if_stale(key);
                Ttl::NotFound
            }
            Some((false, None)) => Ttl::NoExpiry,
            Some((false, Some(remaining))) => Ttl::Remaining(remaining),
        }
    }

    // == Expire If Stale ==
    /// Removes `key` only if its entry is expired at the time of removal.
    ///
    /// A key rewritten with a fresh TTL after it was observed as expired is
    /// left alone.
    pub fn expire_if_stale(&self, key: &str) -> bool {
        let mut lru = self.lru.lock();
        let removed = self
            .entries
            .remove_if(key, |_, entry| entry.is_expired())
            .is_some();

        if removed {
            lru.remove(key);
            self.stats.record_expiration();
            debug!(key = %key, "Expired key removed");
        }
        removed
    }

    // == Dump All ==
    /// Returns a copy of every stored entry, including expired entries that
    /// have not been swept yet.
    pub fn dump_all(&self) -> HashMap<String, CacheEntry> {
        self.entries
            .iter()
            .map(|item| (item.key().clone(), item.value().clone()))
            .collect()
    }

    // == Extract Snapshot ==
    /// Copies entries and recency order under the recency lock.
    pub fn extract_snapshot(&self) -> SnapshotData {
        let lru = self.lru.lock();
        let entries = self.dump_all();
        let order = lru.ordered_keys();
        SnapshotData { entries, order }
    }

    // == Restore From Snapshot ==
    /// Replaces the entire store state.
    ///
    /// Order keys without an entry are dropped. Entries missing from the
    /// order become the least recently used, sorted by key. No expiry or
    /// capacity check is done here.
    pub fn restore_from_snapshot(&self, snapshot: SnapshotData) {
        let SnapshotData { entries, order } = snapshot;

        let ordered: HashSet<&String> = order.iter().collect();
        let mut unordered: Vec<String> = entries
            .keys()
            .filter(|key| !ordered.contains(key))
            .cloned()
            .collect();
        unordered.sort();

        let sequence: Vec<String> = unordered
            .into_iter()
            .chain(order.iter().filter(|key| entries.contains_key(*key)).cloned())
            .collect();

        let mut lru = self.lru.lock();
        self.entries.clear();
        for (key, entry) in entries {
            self.entries.insert(key, entry);
        }
        lru.restore_order(sequence);
        drop(lru);

        info!(keys = self.entries.len(), "Cache store restored from snapshot");
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.entries.len())
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
