//! Device registry.
//!
//! Owns the fixed `DeviceRole -> Device` mapping. The application root builds
//! one registry at start-up and hands it to the orchestrator.

use crate::domain::device::Device;
use crate::domain::errors::{RecoveryError, Result};
use crate::domain::role::{DeviceRole, RecoveryTarget};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Default)]
pub struct DeviceRegistry {
    devices: BTreeMap<DeviceRole, Arc<dyn Device>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the device for its role.
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError::DuplicateDevice`] if the role is already taken.
    pub fn register(&mut self, device: Arc<dyn Device>) -> Result<()> {
        let role = device.role();
        if self.devices.contains_key(&role) {
            return Err(RecoveryError::DuplicateDevice { role });
        }
        debug!("Registered {} as {}", device.display_name(), role);
        self.devices.insert(role, device);
        Ok(())
    }

    pub fn get(&self, role: DeviceRole) -> Option<Arc<dyn Device>> {
        self.devices.get(&role).cloned()
    }

    pub fn contains(&self, role: DeviceRole) -> bool {
        self.devices.contains_key(&role)
    }

    pub fn roles(&self) -> impl Iterator<Item = DeviceRole> + '_ {
        self.devices.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Resolve a recovery target to the devices it names.
    ///
    /// An empty result is a valid outcome, not an error.
    pub fn resolve(&self, target: RecoveryTarget) -> Vec<Arc<dyn Device>> {
        match target {
            RecoveryTarget::All => self.devices.values().cloned().collect(),
            RecoveryTarget::Role(role) => match self.devices.get(&role) {
                Some(device) => vec![device.clone()],
                None => {
                    warn!("No device registered for role {}", role);
                    Vec::new()
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{CallLog, MockDevice};

    fn registry_with(roles: &[DeviceRole]) -> DeviceRegistry {
        let log = CallLog::new();
        let mut registry = DeviceRegistry::new();
        for role in roles {
            registry
                .register(Arc::new(MockDevice::new(*role, log.clone())))
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_resolve_single_role() {
        let registry = registry_with(&[DeviceRole::HeartRateMonitor, DeviceRole::PowerMeter]);
        let targets = registry.resolve(RecoveryTarget::Role(DeviceRole::PowerMeter));
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].role(), DeviceRole::PowerMeter);
    }

    #[test]
    fn test_resolve_all() {
        let registry = registry_with(&DeviceRole::ALL);
        let roles: Vec<_> = registry
            .resolve(RecoveryTarget::All)
            .iter()
            .map(|d| d.role())
            .collect();
        assert_eq!(roles, DeviceRole::ALL.to_vec());
    }

    #[test]
    fn test_resolve_unregistered_role_is_empty() {
        let registry = registry_with(&[DeviceRole::HeartRateMonitor]);
        assert!(registry
            .resolve(RecoveryTarget::Role(DeviceRole::Moxy))
            .is_empty());
    }

    #[test]
    fn test_register_rejects_duplicate_role() {
        let mut registry = registry_with(&[DeviceRole::CoreTemp]);
        let err = registry
            .register(Arc::new(MockDevice::new(DeviceRole::CoreTemp, CallLog::new())))
            .unwrap_err();
        assert!(matches!(
            err,
            RecoveryError::DuplicateDevice {
                role: DeviceRole::CoreTemp
            }
        ));
        assert_eq!(registry.len(), 1);
    }
}
