use crate::locks::KeyedLocks;
use async_trait::async_trait;
use serde_json::Value;
use soma_core::store::validate_key;
use soma_core::{RecordGuard, StateStore, StoreError};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Records kept in process memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<String, Value>>,
    locks: KeyedLocks,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for InMemoryStore {
    async fn read(&self, key: &str) -> Result<Option<Value>, StoreError> {
        validate_key(key)?;
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), StoreError> {
        validate_key(key)?;
        self.records.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn lock(&self, key: &str) -> Result<RecordGuard, StoreError> {
        validate_key(key)?;
        Ok(RecordGuard::new(self.locks.acquire(key).await))
    }
}
