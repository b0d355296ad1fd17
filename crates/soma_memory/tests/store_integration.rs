//! Integration tests for the JSON file store.
//!
//! Uses tempfile::TempDir for isolated data directories.

use serde::{Deserialize, Serialize};
use soma_core::{load_record, store_record, Loaded, StateStore};
use soma_memory::JsonFileStore;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Counter {
    value: u32,
}

/// Records survive reopening the store (simulates a restart).
#[tokio::test]
async fn test_records_survive_reopen() {
    let dir = tempfile::TempDir::new().unwrap();
    {
        let store = JsonFileStore::open(dir.path()).await.unwrap();
        store_record(&store, "p.counter", &Counter { value: 7 })
            .await
            .unwrap();
    }
    let store = JsonFileStore::open(dir.path()).await.unwrap();
    let loaded = load_record(&store, "p.counter", Counter::default).await;
    assert_eq!(loaded, Loaded::Stored(Counter { value: 7 }));
}

/// A garbage file is reported as recovered, not as an error.
#[tokio::test]
async fn test_garbage_file_recovers_to_default() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("p.counter.json"), "[1, 2,").unwrap();
    let store = JsonFileStore::open(dir.path()).await.unwrap();

    let loaded = load_record(&store, "p.counter", Counter::default).await;
    assert!(loaded.is_recovered());
    assert_eq!(loaded.into_inner(), Counter::default());
}

/// Concurrent read-modify-write cycles under the key lock lose no update.
#[tokio::test]
async fn test_locked_increments_are_not_lost() {
    let dir = tempfile::TempDir::new().unwrap();
    let store: Arc<dyn StateStore> = Arc::new(JsonFileStore::open(dir.path()).await.unwrap());

    let mut handles = Vec::new();
    for _ in 0..20 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let _guard = store.lock("p.counter").await.unwrap();
            let mut counter = load_record(store.as_ref(), "p.counter", Counter::default)
                .await
                .into_inner();
            counter.value += 1;
            store_record(store.as_ref(), "p.counter", &counter)
                .await
                .unwrap();
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let counter = load_record(store.as_ref(), "p.counter", Counter::default).await;
    assert_eq!(counter.into_inner().value, 20);
}

/// Two stores on one directory stand in for two `soma` processes: the record
/// lock must hold across them, not only inside one store.
#[tokio::test]
async fn test_lock_excludes_other_store_on_same_dir() {
    let dir = tempfile::TempDir::new().unwrap();
    let first = JsonFileStore::open(dir.path()).await.unwrap();
    let second = JsonFileStore::open(dir.path()).await.unwrap();

    let guard = first.lock("p.needs").await.unwrap();
    let blocked =
        tokio::time::timeout(Duration::from_millis(150), second.lock("p.needs")).await;
    assert!(blocked.is_err(), "second store acquired a held record lock");

    drop(guard);
    let acquired = tokio::time::timeout(Duration::from_secs(5), second.lock("p.needs")).await;
    assert!(acquired.expect("lock should be free after release").is_ok());
}

/// Read-modify-write cycles split across two stores lose no update.
#[tokio::test]
async fn test_increments_across_stores_are_not_lost() {
    let dir = tempfile::TempDir::new().unwrap();
    let stores: Vec<Arc<dyn StateStore>> = vec![
        Arc::new(JsonFileStore::open(dir.path()).await.unwrap()),
        Arc::new(JsonFileStore::open(dir.path()).await.unwrap()),
    ];

    let mut handles = Vec::new();
    for i in 0..20 {
        let store = stores[i % 2].clone();
        handles.push(tokio::spawn(async move {
            let _guard = store.lock("p.counter").await.unwrap();
            let mut counter = load_record(store.as_ref(), "p.counter", Counter::default)
                .await
                .into_inner();
            tokio::task::yield_now().await;
            counter.value += 1;
            store_record(store.as_ref(), "p.counter", &counter)
                .await
                .unwrap();
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let counter = load_record(stores[0].as_ref(), "p.counter", Counter::default).await;
    assert_eq!(counter.into_inner().value, 20);
}
