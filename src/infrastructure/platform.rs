//! Local platform caches.
//!
//! [`LocalPlatform`] backs [`PlatformCaches`] with what a desktop install
//! actually has: two key/value stores, a directory of named cache
//! namespaces, a directory of local databases and, where the OS exposes one,
//! the Bluetooth pairing cache. Anything not configured probes as
//! unsupported.

use crate::domain::errors::SweepError;
use crate::domain::platform::{
    NameFilter, PairingRecord, PlatformCaches, Probe, ProbeResult, StorageScope,
};
use crate::domain::settings::RecoverySettings;
use crate::infrastructure::bluetooth::PairingCache;
use crate::infrastructure::storage::KeyValueStore;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

const APP_DIR: &str = "SensorRecovery";

#[derive(Default)]
pub struct LocalPlatform {
    session_store: Option<KeyValueStore>,
    persistent_store: Option<KeyValueStore>,
    cache_root: Option<PathBuf>,
    cache_namespaces: Vec<String>,
    database_dir: Option<PathBuf>,
    pairings: Option<Arc<dyn PairingCache>>,
}

impl LocalPlatform {
    /// A platform with no capabilities; add them with the `with_*` methods.
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard per-user layout:
    ///
    /// ```text
    /// <cache_dir>/SensorRecovery/session.json     short-lived store
    /// <cache_dir>/SensorRecovery/caches/<ns>/     named caches
    /// <data_dir>/SensorRecovery/storage.json      long-lived store
    /// <data_dir>/SensorRecovery/databases/<name>  local databases
    /// ```
    pub fn from_user_dirs(settings: &RecoverySettings) -> Self {
        let mut platform = Self::new();

        if let Some(cache) = dirs::cache_dir().map(|d| d.join(APP_DIR)) {
            platform = platform
                .with_session_store(KeyValueStore::new(cache.join("session.json")))
                .with_cache_root(cache.join("caches"), settings.cache_namespaces.clone());
        }
        if let Some(data) = dirs::data_dir().map(|d| d.join(APP_DIR)) {
            platform = platform
                .with_persistent_store(KeyValueStore::new(data.join("storage.json")))
                .with_database_dir(data.join("databases"));
        }

        #[cfg(windows)]
        {
            platform = platform.with_pairing_cache(Arc::new(
                crate::infrastructure::bluetooth::pairing::WinRtPairingCache::new(),
            ));
        }

        platform
    }

    pub fn with_session_store(mut self, store: KeyValueStore) -> Self {
        self.session_store = Some(store);
        self
    }

    pub fn with_persistent_store(mut self, store: KeyValueStore) -> Self {
        self.persistent_store = Some(store);
        self
    }

    /// Namespaces are sub-directories of `root`. An empty list clears all.
    pub fn with_cache_root(mut self, root: impl Into<PathBuf>, namespaces: Vec<String>) -> Self {
        self.cache_root = Some(root.into());
        self.cache_namespaces = namespaces;
        self
    }

    pub fn with_database_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.database_dir = Some(dir.into());
        self
    }

    pub fn with_pairing_cache(mut self, pairings: Arc<dyn PairingCache>) -> Self {
        self.pairings = Some(pairings);
        self
    }

    fn store(&self, scope: StorageScope) -> Option<&KeyValueStore> {
        match scope {
            StorageScope::Session => self.session_store.as_ref(),
            StorageScope::Persistent => self.persistent_store.as_ref(),
        }
    }

    fn clears_namespace(&self, name: &str) -> bool {
        self.cache_namespaces.is_empty() || self.cache_namespaces.iter().any(|n| n == name)
    }
}

async fn read_dir_names(dir: &Path) -> Result<Vec<(String, bool)>, SweepError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let is_dir = entry.file_type().await?.is_dir();
        names.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
    }
    names.sort();
    Ok(names)
}

#[async_trait]
impl PlatformCaches for LocalPlatform {
    async fn list_cached_pairings(&self) -> ProbeResult<Vec<PairingRecord>> {
        match &self.pairings {
            Some(pairings) => pairings.list().await.map(Probe::Supported),
            None => Ok(Probe::Unsupported),
        }
    }

    async fn disconnect_if_live(&self, record: &PairingRecord) -> ProbeResult<bool> {
        match &self.pairings {
            Some(pairings) => pairings.disconnect_if_live(record).await.map(Probe::Supported),
            None => Ok(Probe::Unsupported),
        }
    }

    async fn forget_if_supported(&self, record: &PairingRecord) -> ProbeResult<()> {
        match &self.pairings {
            Some(pairings) if pairings.supports_unpair() => {
                pairings.unpair(record).await.map(Probe::Supported)
            }
            _ => Ok(Probe::Unsupported),
        }
    }

    async fn purge_matching_persisted_keys(
        &self,
        scope: StorageScope,
        filter: &NameFilter,
    ) -> ProbeResult<usize> {
        let Some(store) = self.store(scope) else {
            return Ok(Probe::Unsupported);
        };
        let removed = store.remove_matching(filter).await?;
        if removed > 0 {
            info!("Removed {} {:?} key(s) from {}", removed, scope, store.path().display());
        }
        Ok(Probe::Supported(removed))
    }

    async fn purge_structured_caches(&self) -> ProbeResult<usize> {
        let Some(root) = &self.cache_root else {
            return Ok(Probe::Unsupported);
        };

        let mut cleared = 0;
        let mut first_error = None;
        for (name, is_dir) in read_dir_names(root).await? {
            if !is_dir || !self.clears_namespace(&name) {
                continue;
            }
            match tokio::fs::remove_dir_all(root.join(&name)).await {
                Ok(()) => {
                    debug!("Cleared cache namespace {}", name);
                    cleared += 1;
                }
                Err(e) => {
                    warn!("Could not clear cache namespace {}: {}", name, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(Probe::Supported(cleared)),
        }
    }

    async fn list_structured_databases(&self) -> ProbeResult<Vec<String>> {
        let Some(dir) = &self.database_dir else {
            return Ok(Probe::Unsupported);
        };
        let names = read_dir_names(dir)
            .await?
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        Ok(Probe::Supported(names))
    }

    async fn delete_database(&self, name: &str) -> ProbeResult<()> {
        let Some(dir) = &self.database_dir else {
            return Ok(Probe::Unsupported);
        };
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(SweepError::platform(format!("Invalid database name: {}", name)));
        }

        let path = dir.join(name);
        let result = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(&path).await,
            Ok(_) => tokio::fs::remove_file(&path).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                info!("Deleted database {}", path.display());
                Ok(Probe::Supported(()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Probe::Supported(())),
            Err(e) => Err(e.into()),
        }
    }
}
