use crate::locks::KeyedLocks;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fs4::fs_std::FileExt;
use serde_json::Value;
use soma_core::store::validate_key;
use soma_core::{RecordGuard, StateStore, StoreError};
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Records stored as `<dir>/<key>.json`.
///
/// Writes go to a hidden temp file in the same directory, are flushed to disk,
/// then renamed over the record, so a reader sees either the old or the new
/// value and never a torn one.
///
/// [`StateStore::lock`] takes the in-process key mutex and then an exclusive
/// advisory lock on `<dir>/<key>.lock`, so separate processes (and separate
/// stores on the same directory) serialize their read-modify-write cycles.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    locks: KeyedLocks,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        tracing::debug!("Opened JSON store at {}", dir.display());
        Ok(Self {
            dir,
            locks: KeyedLocks::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.lock", key))
    }

    // Keys never start with '.', so temp files can't shadow a record.
    fn temp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!(".{}.json.{}.tmp", key, std::process::id()))
    }
}

fn io_error(key: &str, source: std::io::Error) -> StoreError {
    StoreError::Io {
        key: key.to_string(),
        source,
    }
}

/// Blocks until the OS grants the lock. Closing the file releases it.
fn lock_file(path: &Path) -> std::io::Result<File> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(path)?;
    file.lock_exclusive()?;
    Ok(file)
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn read(&self, key: &str) -> Result<Option<Value>, StoreError> {
        validate_key(key)?;
        let raw = match tokio::fs::read(self.record_path(key)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(key, e)),
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| StoreError::Serde {
                key: key.to_string(),
                source,
            })
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), StoreError> {
        validate_key(key)?;
        let body = serde_json::to_vec_pretty(&value).map_err(|source| StoreError::Serde {
            key: key.to_string(),
            source,
        })?;

        let temp = self.temp_path(key);
        let mut file = tokio::fs::File::create(&temp)
            .await
            .map_err(|e| io_error(key, e))?;
        file.write_all(&body).await.map_err(|e| io_error(key, e))?;
        file.sync_all().await.map_err(|e| io_error(key, e))?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&temp, self.record_path(key)).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(io_error(key, e));
        }
        tracing::trace!("Wrote record '{}' ({} bytes)", key, body.len());
        Ok(())
    }

    async fn lock(&self, key: &str) -> Result<RecordGuard, StoreError> {
        validate_key(key)?;
        let local = self.locks.acquire(key).await;
        let path = self.lock_path(key);
        let file = tokio::task::spawn_blocking(move || lock_file(&path))
            .await
            .map_err(|e| io_error(key, std::io::Error::new(ErrorKind::Other, e)))?
            .map_err(|e| io_error(key, e))?;
        tracing::trace!("Locked record '{}'", key);
        // Fields drop in order: the file lock goes before the local mutex.
        Ok(RecordGuard::new((file, local)))
    }
}
