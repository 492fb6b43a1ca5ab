//! Bonded Sensor Module
//!
//! A configured sensor as the application sees it: its link state and the
//! Bluetooth address it bonded with last. Protocol drivers report link
//! changes through [`BondedSensor::mark_connected`] and
//! [`BondedSensor::mark_disconnected`]; recovery goes through [`Device`].

use crate::domain::device::{ConnectionState, Device};
use crate::domain::errors::DeviceError;
use crate::domain::models::{AppEvent, MessageSeverity, StatusMessage};
use crate::domain::role::DeviceRole;
use crate::domain::settings::{SensorEntry, SettingsService};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Default)]
struct Link {
    state: ConnectionState,
    address: Option<u64>,
}

pub struct BondedSensor {
    role: DeviceRole,
    name: String,
    link: Mutex<Link>,
    settings: Option<Arc<Mutex<SettingsService>>>,
    event_sender: Option<mpsc::UnboundedSender<AppEvent>>,
}

impl BondedSensor {
    /// A sensor with no persisted bond.
    pub fn new(role: DeviceRole, name: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
            link: Mutex::new(Link::default()),
            settings: None,
            event_sender: None,
        }
    }

    /// A sensor whose bond address is persisted in the settings file.
    pub fn from_entry(entry: &SensorEntry, settings: Arc<Mutex<SettingsService>>) -> Self {
        let mut sensor = Self::new(entry.role, entry.name.clone());
        sensor.link.get_mut().unwrap_or_else(|e| e.into_inner()).address = entry.address;
        sensor.settings = Some(settings);
        sensor
    }

    pub fn with_event_sender(mut self, sender: mpsc::UnboundedSender<AppEvent>) -> Self {
        self.event_sender = Some(sender);
        self
    }

    /// Record that the driver brought the link up with `address`.
    pub fn mark_connected(&self, address: u64) {
        {
            let mut link = self.link();
            link.state = ConnectionState::Connected;
            link.address = Some(address);
        }
        info!("{} connected ({:#X})", self.name, address);

        if let Some(settings) = &self.settings {
            let result = settings
                .lock()
                .map_err(|_| anyhow::anyhow!("Lock error"))
                .and_then(|mut s| s.remember_address(self.role, address));
            if let Err(e) = result {
                warn!("Could not persist address for {}: {}", self.name, e);
            }
        }
    }

    /// Record that the link dropped on its own.
    pub fn mark_disconnected(&self) {
        self.link().state = ConnectionState::Disconnected;
    }

    pub fn bonded_address(&self) -> Option<u64> {
        self.link().address
    }

    fn link(&self) -> MutexGuard<'_, Link> {
        self.link.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn send_log(&self, message: String, severity: MessageSeverity) {
        if let Some(sender) = &self.event_sender {
            let _ = sender.send(AppEvent::LogMessage(StatusMessage { message, severity }));
        }
    }
}

#[async_trait]
impl Device for BondedSensor {
    fn role(&self) -> DeviceRole {
        self.role
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn connection_state(&self) -> ConnectionState {
        self.link().state
    }

    async fn disconnect(&self) -> Result<(), DeviceError> {
        let was_connected = {
            let mut link = self.link();
            std::mem::replace(&mut link.state, ConnectionState::Disconnected)
                == ConnectionState::Connected
        };
        if was_connected {
            info!("Disconnected {}", self.name);
            self.send_log(format!("Disconnected {}", self.name), MessageSeverity::Info);
        }
        Ok(())
    }

    async fn forget(&self) -> Result<(), DeviceError> {
        let previous = self.link().address.take();

        if let Some(settings) = &self.settings {
            let mut settings = settings
                .lock()
                .map_err(|_| DeviceError::Storage("Lock error".to_string()))?;
            settings
                .forget_address(self.role)
                .map_err(|e| DeviceError::forget(&self.name, e.to_string()))?;
        }

        if let Some(address) = previous {
            info!("Forgot bond {:#X} for {}", address, self.name);
        }
        Ok(())
    }
}
