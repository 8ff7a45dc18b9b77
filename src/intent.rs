//! Pending-intent slot: the portal path a caller wanted before being
//! redirected. One slot per client, shared by every guard; the last write wins.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::{io::ErrorKind, path::PathBuf, sync::Mutex};
use tokio::fs;
use tracing::{debug, instrument};

use crate::{error::StoreError, ports::IntentStore};

/// Key of the slot in client-local storage.
pub const PENDING_INTENT_KEY: &str = "redirect_after_auth";

#[derive(Debug, Default)]
pub struct MemoryIntentStore {
    slot: Mutex<Option<String>>,
}

impl MemoryIntentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, StoreError> {
        self.slot
            .lock()
            .map_err(|_| StoreError::Unavailable("intent lock poisoned".to_string()))
    }
}

#[async_trait]
impl IntentStore for MemoryIntentStore {
    async fn save(&self, path: &str) -> Result<(), StoreError> {
        *self.lock()? = Some(path.to_string());
        Ok(())
    }

    async fn peek(&self) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.clone())
    }

    async fn take(&self) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.take())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.lock()? = None;
        Ok(())
    }
}

/// Slot persisted in a JSON key-value file (the CLI's local storage).
///
/// Other keys in the file are left untouched.
#[derive(Debug)]
pub struct FileIntentStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileIntentStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Map<String, Value>, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Map::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn update(&self, value: Option<&str>) -> Result<Option<String>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        let previous = match value {
            Some(path) => entries.insert(
                PENDING_INTENT_KEY.to_string(),
                Value::String(path.to_string()),
            ),
            None => entries.remove(PENDING_INTENT_KEY),
        };
        self.store(&entries).await?;
        Ok(previous.and_then(|v| v.as_str().map(str::to_string)))
    }
}

#[async_trait]
impl IntentStore for FileIntentStore {
    #[instrument(skip(self), fields(file = %self.path.display()))]
    async fn save(&self, path: &str) -> Result<(), StoreError> {
        if let Some(previous) = self.update(Some(path)).await?
            && previous != path
        {
            debug!("pending intent {previous} replaced");
        }
        Ok(())
    }

    async fn peek(&self) -> Result<Option<String>, StoreError> {
        let entries = self.load().await?;
        Ok(entries
            .get(PENDING_INTENT_KEY)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    #[instrument(skip(self), fields(file = %self.path.display()))]
    async fn take(&self) -> Result<Option<String>, StoreError> {
        self.update(None).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.update(None).await.map(|_| ())
    }
}
