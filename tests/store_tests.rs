// ABOUTME: Tests for the JSON-file key-value stores
// ABOUTME: Verifies round-trips, corruption handling, persistence, and concurrent access

use claude_slack_bridge::store::{JsonMapStore, ModelAlias, ModelStore, SessionStore};
use std::sync::Arc;

#[test]
fn test_set_then_get_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonMapStore::new(dir.path().join("map.json"));

    store.set("1700000000.000100", "sess_abc").unwrap();

    assert_eq!(
        store.get("1700000000.000100"),
        Some("sess_abc".to_string())
    );
}

#[test]
fn test_get_unknown_key_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonMapStore::new(dir.path().join("map.json"));

    assert_eq!(store.get("never-set"), None);
}

#[test]
fn test_set_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonMapStore::new(dir.path().join("nested").join("deeper").join("map.json"));

    store.set("k", "v").unwrap();

    assert_eq!(store.get("k"), Some("v".to_string()));
    assert!(store.path().exists());
}

#[test]
fn test_last_write_wins() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonMapStore::new(dir.path().join("map.json"));

    store.set("k", "first").unwrap();
    store.set("k", "second").unwrap();

    assert_eq!(store.get("k"), Some("second".to_string()));
}

#[test]
fn test_values_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.json");

    {
        let store = JsonMapStore::new(&path);
        store.set("thread", "sess_1").unwrap();
    }

    let reopened = JsonMapStore::new(&path);
    assert_eq!(reopened.get("thread"), Some("sess_1".to_string()));
}

#[test]
fn test_corrupt_file_reads_as_empty_map() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.json");
    std::fs::write(&path, "not json {").unwrap();

    let store = JsonMapStore::new(&path);
    assert_eq!(store.get("anything"), None);

    // The next write replaces the corrupt file with a valid one
    store.set("k", "v").unwrap();
    assert_eq!(store.get("k"), Some("v".to_string()));
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(serde_json::from_str::<serde_json::Value>(&content).is_ok());
}

#[test]
fn test_file_is_pretty_printed_json_object() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.json");
    let store = JsonMapStore::new(&path);

    store.set("a", "1").unwrap();
    store.set("b", "2").unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value["a"], "1");
    assert_eq!(value["b"], "2");
    assert!(content.contains('\n'), "expected pretty-printed output");
}

#[test]
fn test_concurrent_sets_to_distinct_keys_lose_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonMapStore::new(dir.path().join("map.json")));

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                store
                    .set(&format!("key-{}", i), &format!("value-{}", i))
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for i in 0..20 {
        assert_eq!(
            store.get(&format!("key-{}", i)),
            Some(format!("value-{}", i))
        );
    }
}

#[test]
fn test_interleaved_get_set_under_contention() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonMapStore::new(dir.path().join("map.json")));

    let writers: Vec<_> = (0..10)
        .map(|i| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for round in 0..5 {
                    store
                        .set(&format!("w{}-{}", i, round), &format!("{}", round))
                        .unwrap();
                }
            })
        })
        .collect();
    let readers: Vec<_> = (0..10)
        .map(|i| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for round in 0..5 {
                    // Reads race with writes; they must never fail or corrupt
                    let _ = store.get(&format!("w{}-{}", i, round));
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    for i in 0..10 {
        for round in 0..5 {
            assert_eq!(
                store.get(&format!("w{}-{}", i, round)),
                Some(format!("{}", round))
            );
        }
    }
}

#[test]
fn test_session_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("sessions.json"));

    assert_eq!(store.get("1700000000.000100"), None);
    store.set("1700000000.000100", "sess_123").unwrap();
    assert_eq!(
        store.get("1700000000.000100").as_deref(),
        Some("sess_123")
    );
}

#[test]
fn test_model_store_round_trips_alias() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path().join("models.json"));

    assert_eq!(store.get("C123"), None);
    store.set("C123", ModelAlias::Opus).unwrap();
    assert_eq!(store.get("C123"), Some(ModelAlias::Opus));
}

#[test]
fn test_model_store_ignores_unknown_persisted_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("models.json");
    std::fs::write(&path, r#"{"C123": "some-retired-alias"}"#).unwrap();

    let store = ModelStore::new(&path);
    assert_eq!(store.get("C123"), None);
}
