//! Persistence contract.
//!
//! The engine never talks to disk directly. It reads and writes JSON-shaped
//! records through a [`StateStore`], and wraps each read-modify-write in the
//! per-key guard returned by [`StateStore::lock`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error on record '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("record '{key}' is not valid JSON for its type: {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid record key '{0}'")]
    InvalidKey(String),
}

/// Exclusive access to one record key. Released when dropped.
///
/// Backends put whatever they hold (an async mutex guard, an OS file lock)
/// inside; callers only keep it alive.
pub struct RecordGuard {
    _held: Box<dyn Send + Sync>,
}

impl RecordGuard {
    pub fn new<G: Send + Sync + 'static>(held: G) -> Self {
        Self {
            _held: Box::new(held),
        }
    }
}

impl fmt::Debug for RecordGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RecordGuard")
    }
}

/// Durable key/value storage for state records.
///
/// `read` returns the last durably written value or `None`; `write` is atomic
/// and visible to the next `read`.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<Value>, StoreError>;
    async fn write(&self, key: &str, value: Value) -> Result<(), StoreError>;
    /// Serializes read-modify-write cycles on one key, across every handle
    /// the backend can be opened through. Hold the guard for the whole cycle.
    async fn lock(&self, key: &str) -> Result<RecordGuard, StoreError>;
}

/// Outcome of reading a record, keeping track of where the value came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded<T> {
    /// Parsed from storage.
    Stored(T),
    /// Nothing stored yet; value is the default.
    Missing(T),
    /// Storage failed or held garbage; value is the default.
    Recovered { value: T, error: String },
}

impl<T> Loaded<T> {
    pub fn value(&self) -> &T {
        match self {
            Loaded::Stored(v) | Loaded::Missing(v) => v,
            Loaded::Recovered { value, .. } => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Loaded::Stored(v) | Loaded::Missing(v) => v,
            Loaded::Recovered { value, .. } => value,
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, Loaded::Stored(_))
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self, Loaded::Recovered { .. })
    }
}

/// Read and deserialize a record, substituting `default` when it is absent or broken.
pub async fn load_record<T, F>(store: &dyn StateStore, key: &str, default: F) -> Loaded<T>
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    match store.read(key).await {
        Ok(None) => Loaded::Missing(default()),
        Ok(Some(raw)) => match serde_json::from_value::<T>(raw) {
            Ok(value) => Loaded::Stored(value),
            Err(e) => {
                tracing::warn!("Record '{}' failed to parse, using defaults: {}", key, e);
                Loaded::Recovered {
                    value: default(),
                    error: e.to_string(),
                }
            }
        },
        Err(e) => {
            tracing::warn!("Record '{}' could not be read, using defaults: {}", key, e);
            Loaded::Recovered {
                value: default(),
                error: e.to_string(),
            }
        }
    }
}

/// Serialize and write a record.
pub async fn store_record<T: Serialize>(
    store: &dyn StateStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_value(value).map_err(|source| StoreError::Serde {
        key: key.to_string(),
        source,
    })?;
    store.write(key, raw).await
}

/// Record names, namespaced per persona.
#[derive(Debug, Clone)]
pub struct RecordKeys {
    pub needs: String,
    pub cycle: String,
    pub lifecycle: String,
    pub finance: String,
    pub social: String,
}

impl RecordKeys {
    pub fn for_persona(persona: &str) -> Self {
        Self {
            needs: format!("{}.needs", persona),
            cycle: format!("{}.cycle", persona),
            lifecycle: format!("{}.lifecycle", persona),
            finance: format!("{}.finance", persona),
            social: format!("{}.social", persona),
        }
    }
}

/// Keys may only contain ASCII alphanumerics, `.`, `_` and `-`, and must not start with `.`.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let ok = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}
