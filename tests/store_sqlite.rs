use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use easyconfig::{
    BaseConfig, ConfigEntry, ConfigError, ConfigStore, EntityTable, RegionCache, SaveOptions,
    SqliteTable,
};
use serde_json::json;

type FileStore = ConfigStore<BaseConfig, SqliteTable<BaseConfig>, RegionCache<BaseConfig>>;

fn open_store(path: &std::path::Path) -> FileStore {
    let table = SqliteTable::open(path).expect("open table");
    ConfigStore::new(table, RegionCache::new()).expect("bind store")
}

#[test]
fn test_entries_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.db");

    {
        let store = open_store(&path);
        store
            .save("app.port", json!(8080), SaveOptions::typed("int").locked())
            .unwrap();
        store.save("bob.app.port", json!(9090), SaveOptions::default()).unwrap();
        store.set_global("app.port", true).unwrap();
    }

    let store = open_store(&path);
    let entry = store.get("app.port").unwrap().unwrap();
    assert_eq!(entry.value, json!(8080));
    assert_eq!(entry.value_type.as_deref(), Some("int"));
    assert!(entry.is_locked());
    assert!(entry.is_global());

    let rows = store.get_by_username_and_key("bob", "app.port").unwrap();
    let ids: Vec<&str> = rows.iter().map(ConfigEntry::id).collect();
    assert_eq!(ids, vec!["bob.app.port", "app.port"]);
}

#[test]
fn test_deferred_save_visible_by_id_before_commit() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir.path().join("config.db"));

    store
        .save("app.name", json!("demo"), SaveOptions::default().deferred())
        .unwrap();
    assert_eq!(store.get_configuration_value("app.name").unwrap(), Some(json!("demo")));
    assert_eq!(store.get_values_by_group_key("app").unwrap(), BTreeMap::new());

    // A flushed save commits only its own id; the deferred one stays staged.
    store.save("app.other", json!(1), SaveOptions::default()).unwrap();
    let values = store.get_values_by_group_key("app").unwrap();
    assert_eq!(values, BTreeMap::from([("other".to_string(), json!(1))]));
    assert!(store.table().find_by_id("app.name").unwrap().is_some());
    assert_eq!(store.table().count().unwrap(), 1);
}

#[test]
fn test_batch_with_invalid_key_commits_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir.path().join("config.db"));

    let values = BTreeMap::from([
        ("a".to_string(), json!(1)),
        ("bad..key".to_string(), json!(2)),
    ]);
    let result = store.save_multiple("app", &values, &BTreeMap::new());
    assert!(matches!(result, Err(ConfigError::InvalidKey { .. })));

    assert_eq!(store.table().count().unwrap(), 0);
    assert!(store.get("app.a").unwrap().is_none());
}

#[test]
fn test_concurrent_writers_share_one_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(open_store(&dir.path().join("config.db")));

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..10 {
                    let key = format!("user{worker}.counter.k{i}");
                    store.save(&key, json!(i), SaveOptions::default()).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.table().count().unwrap(), 40);
    for worker in 0..4 {
        let rows = store
            .get_by_username_and_group(&format!("user{worker}"), "counter")
            .unwrap();
        assert_eq!(rows.len(), 10);
    }
}

#[test]
fn test_removed_entry_gone_from_cached_group() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir.path().join("config.db"));
    store.save("theme.color", json!("red"), SaveOptions::default()).unwrap();

    assert!(store.load_all_by_group("theme").unwrap().is_some());
    store.remove_by_key("theme.color").unwrap();
    assert!(store.load_all_by_group("theme").unwrap().is_none());
    assert!(store.table().find_by_id("theme.color").unwrap().is_none());
}
