use super::{Call, CallLog};
use crate::domain::device::{ConnectionState, Device};
use crate::domain::errors::DeviceError;
use crate::domain::role::DeviceRole;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Scriptable device. Disconnected and bonded by default.
pub struct MockDevice {
    role: DeviceRole,
    name: String,
    state: Mutex<ConnectionState>,
    bonded: Mutex<bool>,
    disconnect_error: Option<String>,
    forget_error: Option<String>,
    disconnect_delay: Duration,
    log: CallLog,
}

impl MockDevice {
    pub fn new(role: DeviceRole, log: CallLog) -> Self {
        Self {
            role,
            name: format!("Mock {}", role.label()),
            state: Mutex::new(ConnectionState::Disconnected),
            bonded: Mutex::new(true),
            disconnect_error: None,
            forget_error: None,
            disconnect_delay: Duration::ZERO,
            log,
        }
    }

    pub fn connected(self) -> Self {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = ConnectionState::Connected;
        self
    }

    /// Every `disconnect` fails with `message` and leaves the link up.
    pub fn failing_disconnect(mut self, message: impl Into<String>) -> Self {
        self.disconnect_error = Some(message.into());
        self
    }

    pub fn failing_forget(mut self, message: impl Into<String>) -> Self {
        self.forget_error = Some(message.into());
        self
    }

    /// Make `disconnect` take `delay` before settling.
    pub fn with_disconnect_delay(mut self, delay: Duration) -> Self {
        self.disconnect_delay = delay;
        self
    }

    pub fn is_bonded(&self) -> bool {
        *self.bonded.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Device for MockDevice {
    fn role(&self) -> DeviceRole {
        self.role
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn connection_state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn disconnect(&self) -> Result<(), DeviceError> {
        self.log.push(Call::DisconnectStarted(self.role));
        if !self.disconnect_delay.is_zero() {
            tokio::time::sleep(self.disconnect_delay).await;
        }

        let result = match &self.disconnect_error {
            Some(message) => Err(DeviceError::disconnect(&self.name, message.clone())),
            None => {
                *self.state.lock().unwrap_or_else(|e| e.into_inner()) =
                    ConnectionState::Disconnected;
                Ok(())
            }
        };
        self.log.push(Call::DisconnectSettled(self.role));
        result
    }

    async fn forget(&self) -> Result<(), DeviceError> {
        self.log.push(Call::ForgetStarted(self.role));
        let result = match &self.forget_error {
            Some(message) => Err(DeviceError::forget(&self.name, message.clone())),
            None => {
                *self.bonded.lock().unwrap_or_else(|e| e.into_inner()) = false;
                Ok(())
            }
        };
        self.log.push(Call::ForgetSettled(self.role));
        result
    }
}
