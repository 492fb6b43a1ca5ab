//! Error types for device recovery.
//!
//! Only [`RecoveryError`] ever reaches the caller of a recovery run. Device and
//! sweep errors are contained where they happen and recorded in the report.

use crate::domain::role::DeviceRole;

/// Errors reported by a [`Device`](crate::domain::device::Device) driver.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The transport reported a failure while closing the link.
    #[error("Disconnect failed for {device}: {message}")]
    Disconnect { device: String, message: String },

    /// The cached bond could not be removed.
    #[error("Forget failed for {device}: {message}")]
    Forget { device: String, message: String },

    /// Settings or bond storage error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl DeviceError {
    pub fn disconnect(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Disconnect {
            device: device.into(),
            message: message.into(),
        }
    }

    pub fn forget(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Forget {
            device: device.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by a single platform sweep sub-step.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed store: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The platform API rejected the request.
    #[error("Platform error: {0}")]
    Platform(String),
}

impl SweepError {
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform(message.into())
    }
}

/// Errors returned to the caller of a recovery run.
#[derive(Debug, thiserror::Error)]
pub enum RecoveryError {
    /// A specific role was requested but no device is registered for it.
    #[error("No device registered for role {role}")]
    NoMatchingDevice { role: DeviceRole },

    /// A second device was registered for an already occupied role.
    #[error("A device is already registered for role {role}")]
    DuplicateDevice { role: DeviceRole },
}

/// Result type alias for recovery operations.
pub type Result<T> = std::result::Result<T, RecoveryError>;
