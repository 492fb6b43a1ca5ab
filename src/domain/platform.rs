//! Platform cache capabilities.
//!
//! Pairing state can linger outside the device drivers: in the OS Bluetooth
//! stack, in persisted key/value stores, in named caches and in local
//! databases. Each of those is an optional capability. A platform that lacks
//! one returns [`Probe::Unsupported`] instead of an error, so the sweep can
//! tell "absent" apart from "failed".

use crate::domain::errors::SweepError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of calling an optional platform capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    Supported(T),
    Unsupported,
}

impl<T> Probe<T> {
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Probe<U> {
        match self {
            Self::Supported(value) => Probe::Supported(f(value)),
            Self::Unsupported => Probe::Unsupported,
        }
    }
}

pub type ProbeResult<T> = Result<Probe<T>, SweepError>;

/// A pairing record held by the platform Bluetooth stack.
///
/// Opaque to this crate: only the platform adapter interprets `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingRecord {
    pub id: String,
    pub name: String,
}

/// Persisted key/value store scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageScope {
    /// Cleared on restart in normal operation.
    Session,
    /// Survives restarts.
    Persistent,
}

impl StorageScope {
    pub const ALL: [StorageScope; 2] = [Self::Session, Self::Persistent];
}

/// Case-insensitive substring filter over key and database names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameFilter {
    patterns: Vec<String>,
}

impl NameFilter {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.patterns.iter().any(|p| name.contains(p.as_str()))
    }
}

/// Best-effort access to platform-level pairing and storage caches.
///
/// Every method is independently fallible. Callers treat an error as a
/// failure of that single sub-step only.
#[async_trait]
pub trait PlatformCaches: Send + Sync {
    /// Enumerate pairing records cached by the OS Bluetooth stack.
    async fn list_cached_pairings(&self) -> ProbeResult<Vec<PairingRecord>>;

    /// Close the record's session if it is live. Yields `true` when a live
    /// session was closed.
    async fn disconnect_if_live(&self, record: &PairingRecord) -> ProbeResult<bool>;

    /// Ask the platform to drop the pairing.
    async fn forget_if_supported(&self, record: &PairingRecord) -> ProbeResult<()>;

    /// Remove every key in `scope` accepted by `filter`. Yields the number of
    /// keys removed.
    async fn purge_matching_persisted_keys(
        &self,
        scope: StorageScope,
        filter: &NameFilter,
    ) -> ProbeResult<usize>;

    /// Clear local named-cache namespaces. Yields the number cleared.
    async fn purge_structured_caches(&self) -> ProbeResult<usize>;

    async fn list_structured_databases(&self) -> ProbeResult<Vec<String>>;

    async fn delete_database(&self, name: &str) -> ProbeResult<()>;
}

/// A platform with none of the optional capabilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlatformCaches;

#[async_trait]
impl PlatformCaches for NoPlatformCaches {
    async fn list_cached_pairings(&self) -> ProbeResult<Vec<PairingRecord>> {
        Ok(Probe::Unsupported)
    }

    async fn disconnect_if_live(&self, _record: &PairingRecord) -> ProbeResult<bool> {
        Ok(Probe::Unsupported)
    }

    async fn forget_if_supported(&self, _record: &PairingRecord) -> ProbeResult<()> {
        Ok(Probe::Unsupported)
    }

    async fn purge_matching_persisted_keys(
        &self,
        _scope: StorageScope,
        _filter: &NameFilter,
    ) -> ProbeResult<usize> {
        Ok(Probe::Unsupported)
    }

    async fn purge_structured_caches(&self) -> ProbeResult<usize> {
        Ok(Probe::Unsupported)
    }

    async fn list_structured_databases(&self) -> ProbeResult<Vec<String>> {
        Ok(Probe::Unsupported)
    }

    async fn delete_database(&self, _name: &str) -> ProbeResult<()> {
        Ok(Probe::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_filter_is_case_insensitive() {
        let filter = NameFilter::new(["bluetooth", "BLE", "device"]);
        assert!(filter.matches("lastBluetoothDevice"));
        assert!(filter.matches("BLE_CACHE"));
        assert!(filter.matches("pairedDevices"));
        assert!(!filter.matches("workoutHistory"));
    }

    #[test]
    fn test_name_filter_ignores_blank_patterns() {
        let filter = NameFilter::new(["", "  "]);
        assert!(!filter.matches("anything"));
    }
}
