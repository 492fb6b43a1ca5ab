use super::{Call, CallLog};
use crate::domain::errors::SweepError;
use crate::domain::platform::{
    NameFilter, PairingRecord, PlatformCaches, Probe, ProbeResult, StorageScope,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

/// In-memory platform caches.
///
/// Capabilities left as `None` probe as unsupported. Operations named in
/// [`fail_on`](Self::fail_on) return an error instead. Operation names are
/// the ones pushed to the call log, e.g. `"list_cached_pairings"` or
/// `"forget_if_supported:Polar H10"`.
#[derive(Default)]
pub struct MockPlatform {
    pairings: Option<Mutex<Vec<(PairingRecord, bool)>>>,
    unpair_supported: bool,
    session_keys: Option<Mutex<Vec<String>>>,
    persistent_keys: Option<Mutex<Vec<String>>>,
    cache_namespaces: Option<Mutex<usize>>,
    databases: Option<Mutex<Vec<String>>>,
    failing: HashSet<String>,
    log: CallLog,
}

fn guard<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl MockPlatform {
    /// A platform where every capability is absent.
    pub fn unavailable(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// A platform where every capability exists but holds nothing.
    pub fn empty(log: CallLog) -> Self {
        Self {
            pairings: Some(Mutex::new(Vec::new())),
            unpair_supported: true,
            session_keys: Some(Mutex::new(Vec::new())),
            persistent_keys: Some(Mutex::new(Vec::new())),
            cache_namespaces: Some(Mutex::new(0)),
            databases: Some(Mutex::new(Vec::new())),
            log,
            ..Self::default()
        }
    }

    /// Add an OS pairing record. `live` marks an open session.
    pub fn with_pairing(mut self, name: &str, live: bool) -> Self {
        let record = PairingRecord {
            id: format!("BluetoothLE#{}", name),
            name: name.to_string(),
        };
        self.pairings
            .get_or_insert_with(|| Mutex::new(Vec::new()))
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .push((record, live));
        self
    }

    pub fn without_unpair(mut self) -> Self {
        self.unpair_supported = false;
        self
    }

    pub fn with_keys(mut self, scope: StorageScope, keys: &[&str]) -> Self {
        let slot = match scope {
            StorageScope::Session => &mut self.session_keys,
            StorageScope::Persistent => &mut self.persistent_keys,
        };
        slot.get_or_insert_with(|| Mutex::new(Vec::new()))
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .extend(keys.iter().map(|k| k.to_string()));
        self
    }

    pub fn with_cache_namespaces(mut self, count: usize) -> Self {
        self.cache_namespaces = Some(Mutex::new(count));
        self
    }

    pub fn with_databases(mut self, names: &[&str]) -> Self {
        self.databases = Some(Mutex::new(names.iter().map(|n| n.to_string()).collect()));
        self
    }

    pub fn fail_on(mut self, operation: &str) -> Self {
        self.failing.insert(operation.to_string());
        self
    }

    pub fn keys(&self, scope: StorageScope) -> Vec<String> {
        let slot = match scope {
            StorageScope::Session => &self.session_keys,
            StorageScope::Persistent => &self.persistent_keys,
        };
        slot.as_ref().map(|k| guard(k).clone()).unwrap_or_default()
    }

    pub fn databases(&self) -> Vec<String> {
        self.databases.as_ref().map(|d| guard(d).clone()).unwrap_or_default()
    }

    pub fn paired_names(&self) -> Vec<String> {
        self.pairings
            .as_ref()
            .map(|p| guard(p).iter().map(|(r, _)| r.name.clone()).collect())
            .unwrap_or_default()
    }

    fn call(&self, operation: String) -> Result<(), SweepError> {
        let failing = self.failing.contains(&operation);
        self.log.push(Call::Platform(operation.clone()));
        if failing {
            return Err(SweepError::platform(format!("{} failed", operation)));
        }
        Ok(())
    }
}

#[async_trait]
impl PlatformCaches for MockPlatform {
    async fn list_cached_pairings(&self) -> ProbeResult<Vec<PairingRecord>> {
        let Some(pairings) = &self.pairings else {
            return Ok(Probe::Unsupported);
        };
        self.call("list_cached_pairings".to_string())?;
        Ok(Probe::Supported(
            guard(pairings).iter().map(|(r, _)| r.clone()).collect(),
        ))
    }

    async fn disconnect_if_live(&self, record: &PairingRecord) -> ProbeResult<bool> {
        let Some(pairings) = &self.pairings else {
            return Ok(Probe::Unsupported);
        };
        self.call(format!("disconnect_if_live:{}", record.name))?;
        let mut pairings = guard(pairings);
        let closed = pairings
            .iter_mut()
            .find(|(r, _)| r == record)
            .map(|(_, live)| std::mem::replace(live, false))
            .unwrap_or(false);
        Ok(Probe::Supported(closed))
    }

    async fn forget_if_supported(&self, record: &PairingRecord) -> ProbeResult<()> {
        let Some(pairings) = &self.pairings else {
            return Ok(Probe::Unsupported);
        };
        if !self.unpair_supported {
            return Ok(Probe::Unsupported);
        }
        self.call(format!("forget_if_supported:{}", record.name))?;
        guard(pairings).retain(|(r, _)| r != record);
        Ok(Probe::Supported(()))
    }

    async fn purge_matching_persisted_keys(
        &self,
        scope: StorageScope,
        filter: &NameFilter,
    ) -> ProbeResult<usize> {
        let slot = match scope {
            StorageScope::Session => &self.session_keys,
            StorageScope::Persistent => &self.persistent_keys,
        };
        let Some(keys) = slot else {
            return Ok(Probe::Unsupported);
        };
        self.call(format!("purge_keys:{:?}", scope))?;
        let mut keys = guard(keys);
        let before = keys.len();
        keys.retain(|k| !filter.matches(k));
        Ok(Probe::Supported(before - keys.len()))
    }

    async fn purge_structured_caches(&self) -> ProbeResult<usize> {
        let Some(count) = &self.cache_namespaces else {
            return Ok(Probe::Unsupported);
        };
        self.call("purge_caches".to_string())?;
        Ok(Probe::Supported(std::mem::take(&mut *guard(count))))
    }

    async fn list_structured_databases(&self) -> ProbeResult<Vec<String>> {
        let Some(databases) = &self.databases else {
            return Ok(Probe::Unsupported);
        };
        self.call("list_databases".to_string())?;
        Ok(Probe::Supported(guard(databases).clone()))
    }

    async fn delete_database(&self, name: &str) -> ProbeResult<()> {
        let Some(databases) = &self.databases else {
            return Ok(Probe::Unsupported);
        };
        self.call(format!("delete_database:{}", name))?;
        guard(databases).retain(|d| d != name);
        Ok(Probe::Supported(()))
    }
}
