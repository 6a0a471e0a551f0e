//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the engine invariants: bounded size, the entry /
//! recency bijection, LRU order and snapshot round-trips.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::thread;

use crate::cache::{CacheStore, SnapshotData};

// == Test Configuration ==
const TEST_CAPACITY: usize = 100;

// == Strategies ==
/// Generates cache keys from a small alphabet so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-h]{1,2}".prop_map(|s| s)
}

/// Generates valid cache keys from a wide alphabet
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,64}".prop_map(|s| s)
}

/// Generates cache values
fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,256}".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
    Exists { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        2 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Delete { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Exists { key }),
    ]
}

fn apply(store: &CacheStore, op: &CacheOp) {
    match op {
        CacheOp::Set { key, value } => store.set(key.as_str(), value.as_str(), None),
        CacheOp::Get { key } => {
            store.get(key);
        }
        CacheOp::Delete { key } => {
            store.delete(key);
        }
        CacheOp::Exists { key } => {
            store.exists(key);
        }
    }
}

fn keys_match_order(snapshot: &SnapshotData) -> bool {
    let keys: HashSet<&String> = snapshot.entries.keys().collect();
    let ordered: HashSet<&String> = snapshot.order.iter().collect();
    ordered.len() == snapshot.order.len() && keys == ordered
}

// == Reference Model ==
/// Straightforward LRU used as an oracle: a map plus an oldest-first list.
#[derive(Debug, Default)]
struct ModelLru {
    capacity: usize,
    values: HashMap<String, String>,
    order: Vec<String>,
}

impl ModelLru {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    fn touch(&mut self, key: &str) {
        self.order.retain(|k| k != key);
        self.order.push(key.to_string());
    }

    fn apply(&mut self, op: &CacheOp) {
        match op {
            CacheOp::Set { key, value } => {
                self.values.insert(key.clone(), value.clone());
                self.touch(key);
                if self.order.len() > self.capacity {
                    let victim = self.order.remove(0);
                    self.values.remove(&victim);
                }
            }
            CacheOp::Get { key } | CacheOp::Exists { key } => {
                if self.values.contains_key(key) {
                    self.touch(key);
                }
            }
            CacheOp::Delete { key } => {
                self.values.remove(key);
                self.order.retain(|k| k != key);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // *For any* sequence of operations, hits and misses reflect the reads made.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let store = CacheStore::new(TEST_CAPACITY).unwrap();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in &ops {
            match op {
                CacheOp::Get { key } => match store.get(key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Exists { key } => {
                    if store.exists(key) {
                        expected_hits += 1;
                    } else {
                        expected_misses += 1;
                    }
                }
                other => apply(&store, other),
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, store.len(), "Total entries mismatch");
    }

    // *For any* key-value pair, a stored value reads back unchanged.
    #[test]
    fn prop_roundtrip_storage(key in valid_key_strategy(), value in valid_value_strategy()) {
        let store = CacheStore::new(TEST_CAPACITY).unwrap();

        store.set(key.clone(), value.clone(), None);

        prop_assert_eq!(store.get(&key), Some(value), "Round-trip value mismatch");
    }

    // *For any* stored key, delete reports the removal once and only once.
    #[test]
    fn prop_delete_is_idempotent(key in valid_key_strategy(), value in valid_value_strategy()) {
        let store = CacheStore::new(TEST_CAPACITY).unwrap();
        store.set(key.clone(), value, None);

        prop_assert!(store.delete(&key), "First delete should remove the key");
        prop_assert!(!store.delete(&key), "Second delete should be a no-op");
        prop_assert!(store.get(&key).is_none(), "Key should not exist after delete");
    }

    // *For any* key, storing V1 then V2 leaves a single entry holding V2.
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        value1 in valid_value_strategy(),
        value2 in valid_value_strategy()
    ) {
        let store = CacheStore::new(TEST_CAPACITY).unwrap();

        store.set(key.clone(), value1, None);
        store.set(key.clone(), value2.clone(), None);

        prop_assert_eq!(store.get(&key), Some(value2), "Overwrite should return new value");
        prop_assert_eq!(store.len(), 1, "Should have exactly one entry after overwrite");
    }

    // *For any* sequence of operations, size stays within capacity and every
    // stored key appears exactly once in the recency order.
    #[test]
    fn prop_capacity_and_bijection(
        capacity in 1usize..8,
        ops in prop::collection::vec(cache_op_strategy(), 1..200)
    ) {
        let store = CacheStore::new(capacity).unwrap();

        for op in &ops {
            apply(&store, op);
            prop_assert!(
                store.len() <= capacity,
                "Cache size {} exceeds capacity {}",
                store.len(),
                capacity
            );
            prop_assert!(keys_match_order(&store.extract_snapshot()), "Bijection broken after {:?}", op);
        }
    }

    // *For any* sequence of operations, contents and recency order match a
    // reference LRU.
    #[test]
    fn prop_matches_reference_lru(
        capacity in 1usize..6,
        ops in prop::collection::vec(cache_op_strategy(), 1..150)
    ) {
        let store = CacheStore::new(capacity).unwrap();
        let mut model = ModelLru::new(capacity);

        for op in &ops {
            apply(&store, op);
            model.apply(op);
        }

        let snapshot = store.extract_snapshot();
        let values: HashMap<String, String> = snapshot
            .entries
            .into_iter()
            .map(|(key, entry)| (key, entry.value))
            .collect();
        prop_assert_eq!(values, model.values);
        prop_assert_eq!(snapshot.order, model.order);
    }

    // *For any* sequence of sets, a snapshot restored into a fresh store of
    // equal capacity has the same contents and evicts the same key next.
    #[test]
    fn prop_snapshot_round_trip(
        capacity in 1usize..8,
        ops in prop::collection::vec(cache_op_strategy(), 1..100),
        new_key in "[x-z]{3}"
    ) {
        let original = CacheStore::new(capacity).unwrap();
        for op in &ops {
            apply(&original, op);
        }

        let restored = CacheStore::new(capacity).unwrap();
        restored.restore_from_snapshot(original.extract_snapshot());
        prop_assert_eq!(restored.dump_all(), original.dump_all());

        original.set(new_key.clone(), "new", None);
        restored.set(new_key, "new", None);

        let original_keys: HashSet<String> = original.dump_all().into_keys().collect();
        let restored_keys: HashSet<String> = restored.dump_all().into_keys().collect();
        prop_assert_eq!(restored_keys, original_keys, "Eviction diverged after restore");
    }

    // *For any* full cache, inserting a new key evicts the first key inserted.
    #[test]
    fn prop_lru_eviction_order(
        initial_keys in prop::collection::hash_set(valid_key_strategy(), 2..10),
        new_key in valid_key_strategy(),
        new_value in valid_value_strategy()
    ) {
        prop_assume!(!initial_keys.contains(&new_key));
        let unique_keys: Vec<String> = initial_keys.into_iter().collect();

        let capacity = unique_keys.len();
        let store = CacheStore::new(capacity).unwrap();

        for key in &unique_keys {
            store.set(key.clone(), format!("value_{}", key), None);
        }
        prop_assert_eq!(store.len(), capacity, "Cache should be at capacity");

        store.set(new_key.clone(), new_value, None);

        prop_assert_eq!(store.len(), capacity, "Cache should remain at capacity after eviction");
        prop_assert!(store.get(&unique_keys[0]).is_none(), "Oldest key should have been evicted");
        prop_assert!(store.get(&new_key).is_some(), "New key should exist after insertion");
        for key in unique_keys.iter().skip(1) {
            prop_assert!(store.get(key).is_some(), "Key '{}' should still exist", key);
        }
    }

    // *For any* full cache, reading the oldest key protects it from eviction.
    #[test]
    fn prop_lru_access_tracking(
        keys in prop::collection::hash_set(valid_key_strategy(), 3..8),
        new_key in valid_key_strategy(),
        new_value in valid_value_strategy()
    ) {
        prop_assume!(!keys.contains(&new_key));
        let unique_keys: Vec<String> = keys.into_iter().collect();

        let store = CacheStore::new(unique_keys.len()).unwrap();
        for key in &unique_keys {
            store.set(key.clone(), format!("value_{}", key), None);
        }

        let accessed_key = unique_keys[0].clone();
        let _ = store.get(&accessed_key);
        let expected_evicted = unique_keys[1].clone();

        store.set(new_key.clone(), new_value, None);

        prop_assert!(store.get(&accessed_key).is_some(), "Accessed key should not be evicted");
        prop_assert!(store.get(&expected_evicted).is_none(), "Second key should have been evicted");
        prop_assert!(store.get(&new_key).is_some(), "New key should exist");
    }
}

// Fewer cases for the threaded property; each case spawns workers
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    // *For any* interleaving of concurrent operations, the store ends within
    // capacity with entries and recency order in agreement.
    #[test]
    fn prop_concurrent_operation_correctness(
        batches in prop::collection::vec(prop::collection::vec(cache_op_strategy(), 10..60), 2..6)
    ) {
        let capacity = 5;
        let store = Arc::new(CacheStore::new(capacity).unwrap());

        thread::scope(|scope| {
            for batch in &batches {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    for op in batch {
                        apply(&store, op);
                    }
                });
            }
        });

        prop_assert!(store.len() <= capacity, "Cache should not exceed capacity");
        prop_assert!(keys_match_order(&store.extract_snapshot()), "Bijection broken");

        let hit_rate = store.stats().hit_rate();
        prop_assert!((0.0..=1.0).contains(&hit_rate), "Hit rate out of range: {}", hit_rate);
    }
}
