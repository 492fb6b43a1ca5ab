//! JSON-file key/value store.
//!
//! The app keeps two of these: a short-lived one under the cache directory
//! and a long-lived one under the data directory. Sensor drivers and the UI
//! put last-seen device ids, scan results and similar state there, which is
//! why recovery purges matching keys.

use crate::domain::errors::SweepError;
use crate::domain::platform::NameFilter;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub type StoreMap = BTreeMap<String, Value>;

#[derive(Debug, Clone)]
pub struct KeyValueStore {
    path: PathBuf,
}

impl KeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole store. A missing file is an empty store.
    pub async fn load(&self) -> Result<StoreMap, SweepError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(StoreMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(StoreMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, map: &StoreMap) -> Result<(), SweepError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(map)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<Value>, SweepError> {
        Ok(self.load().await?.remove(key))
    }

    pub async fn set(&self, key: impl Into<String>, value: Value) -> Result<(), SweepError> {
        let mut map = self.load().await?;
        map.insert(key.into(), value);
        self.write(&map).await
    }

    pub async fn keys(&self) -> Result<Vec<String>, SweepError> {
        Ok(self.load().await?.into_keys().collect())
    }

    /// Remove every key accepted by `filter`. The file is only rewritten
    /// when something was removed.
    pub async fn remove_matching(&self, filter: &NameFilter) -> Result<usize, SweepError> {
        let mut map = self.load().await?;
        let before = map.len();
        map.retain(|key, _| {
            let matched = filter.matches(key);
            if matched {
                debug!("Removing stored key {} from {}", key, self.path.display());
            }
            !matched
        });
        let removed = before - map.len();
        if removed > 0 {
            self.write(&map).await?;
        }
        Ok(removed)
    }
}
