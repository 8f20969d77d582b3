//! Contract tests run against every `SettingsStore` implementation.

use exthealth_state::fakes::MemorySettingsStore;
use exthealth_state::{JsonFileSettingsStore, SettingsStore, StoreError};
use serde_json::json;

async fn empty_store_loads_none(store: &dyn SettingsStore) {
    assert!(store.load().await.unwrap().is_none());
}

async fn last_save_wins(store: &dyn SettingsStore) {
    store.save(&json!({ "autoScanIntervalHours": 1 })).await.unwrap();
    store.save(&json!({ "autoScanIntervalHours": 2 })).await.unwrap();
    let loaded = store.load().await.unwrap().unwrap();
    assert_eq!(loaded["autoScanIntervalHours"], 2);
}

async fn nested_blob_survives(store: &dyn SettingsStore) {
    let blob = json!({
        "enableAutoScan": true,
        "autoScanIntervalHours": 24,
        "cachedSnapshot": {
            "checkedAt": 1_700_000_000_000_i64,
            "results": [{ "id": "foo", "lastUpdated": null }],
            "summary": { "green": 0, "yellow": 0, "red": 0, "black": 1 }
        }
    });
    store.save(&blob).await.unwrap();
    assert_eq!(store.load().await.unwrap(), Some(blob));
}

#[tokio::test]
async fn memory_store_contract() {
    empty_store_loads_none(&MemorySettingsStore::new()).await;
    last_save_wins(&MemorySettingsStore::new()).await;
    nested_blob_survives(&MemorySettingsStore::new()).await;
}

#[tokio::test]
async fn json_file_store_contract() {
    let dir = tempfile::tempdir().unwrap();
    empty_store_loads_none(&JsonFileSettingsStore::new(dir.path().join("a.json"))).await;
    last_save_wins(&JsonFileSettingsStore::new(dir.path().join("b.json"))).await;
    nested_blob_survives(&JsonFileSettingsStore::new(dir.path().join("c.json"))).await;
}

#[tokio::test]
async fn failed_save_keeps_previous_value() {
    let store = MemorySettingsStore::new();
    store.save(&json!({ "v": 1 })).await.unwrap();

    store.set_fail_saves(true);
    let err = store.save(&json!({ "v": 2 })).await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));

    assert_eq!(store.load().await.unwrap(), Some(json!({ "v": 1 })));
    assert_eq!(store.save_count(), 1);
}
