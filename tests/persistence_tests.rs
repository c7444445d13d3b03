//! Integration Tests for Repository Persistence
//!
//! Exercises the registry against real files: reload, fallback on bad
//! state, destroy and the shutdown sweep.

use std::fs;
use std::time::Duration;

use lru_repo::cache::{Entry, ValueKind, FORMAT_VERSION};
use lru_repo::{Registry, RepositoryOptions};
use serde_json::json;

fn options(max_size: usize) -> RepositoryOptions {
    RepositoryOptions {
        max_size,
        save_delay: Duration::from_secs(300),
    }
}

#[test]
fn test_round_trip_under_fresh_name() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = Registry::new(dir.path());

    let original = registry.open("r1", options(10)).unwrap();
    original.put("foo", 44).unwrap();
    original.save(true).unwrap();

    fs::copy(dir.path().join("r1.json"), dir.path().join("r2.json")).unwrap();

    let copy = registry.open("r2", options(10)).unwrap();
    assert_eq!(copy.get("foo", None::<i64>), Some(44));
    assert!(copy.validate());
}

#[test]
fn test_unsaved_burst_is_lost_without_flush() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut registry = Registry::new(dir.path());
        let repo = registry.open("burst", options(10)).unwrap();
        repo.put("first", 1).unwrap();
        repo.put("second", 2).unwrap();
    }

    let mut registry = Registry::new(dir.path());
    let repo = registry.open("burst", options(10)).unwrap();
    assert!(repo.has("first"));
    assert!(!repo.has("second"));
}

#[test]
fn test_shutdown_persists_burst() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut registry = Registry::new(dir.path());
        let repo = registry.open("burst", options(10)).unwrap();
        repo.put("first", 1).unwrap();
        repo.put("second", 2).unwrap();
        registry.shutdown();
    }

    let mut registry = Registry::new(dir.path());
    let repo = registry.open("burst", options(10)).unwrap();
    assert_eq!(repo.most_to_least_recent(), vec!["second", "first"]);
}

#[test]
fn test_shutdown_drops_invalid_entries() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut registry = Registry::new(dir.path());
        let repo = registry.open("mixed", options(10)).unwrap();
        repo.put("ok", "fine").unwrap();
        repo.put_entry(
            "drifted",
            Entry {
                value: json!(3),
                declared_kind: Some(ValueKind::String),
            },
        );
        assert!(!repo.validate());
        registry.shutdown();
    }

    let mut registry = Registry::new(dir.path());
    let repo = registry.open("mixed", options(10)).unwrap();
    assert_eq!(repo.len(), 1);
    assert!(repo.has("ok"));
    assert!(repo.validate());
}

#[test]
fn test_stale_version_falls_back_to_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let body = r#"{"version":"0.0.0-stale","max_size":10,"save_delay_ms":0,
        "table":{"foo":{"value":44,"declared_kind":"integer"}},"recency":["foo"]}"#;
    fs::write(dir.path().join("old.json"), body).unwrap();

    let mut registry = Registry::new(dir.path());
    let repo = registry.open("old", options(4)).unwrap();

    assert!(repo.is_empty());
    assert_eq!(repo.max_size(), 4);
    assert_eq!(repo.format_version(), FORMAT_VERSION);
}

#[test]
fn test_invalid_entry_in_file_falls_back_to_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let body = format!(
        r#"{{"version":"{}","max_size":10,"save_delay_ms":0,
            "table":{{"foo":{{"value":"x","declared_kind":"integer"}}}},"recency":["foo"]}}"#,
        FORMAT_VERSION
    );
    fs::write(dir.path().join("drift.json"), body).unwrap();

    let mut registry = Registry::new(dir.path());
    assert!(registry.open("drift", options(4)).unwrap().is_empty());
}

#[test]
fn test_destroy_twice_then_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = Registry::new(dir.path());

    registry.open("team/users", options(10)).unwrap().put("a", 1).unwrap();
    assert!(dir.path().join("team/users.json").exists());

    registry.destroy("team/users").unwrap();
    registry.destroy("team/users").unwrap();

    let repo = registry.open("team/users", options(10)).unwrap();
    assert!(repo.is_empty());
    assert!(repo.most_to_least_recent().is_empty());
}

#[test]
fn test_eviction_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut registry = Registry::new(dir.path());
        let repo = registry.open("small", options(3)).unwrap();
        for (i, key) in ["a", "b", "c", "d"].into_iter().enumerate() {
            repo.put(key, i).unwrap();
        }
        repo.save(true).unwrap();
    }

    let mut registry = Registry::new(dir.path());
    let repo = registry.open("small", options(100)).unwrap();
    assert_eq!(repo.max_size(), 3);
    assert_eq!(repo.least_to_most_recent(), vec!["b", "c", "d"]);
    assert!(repo.validate());
}
