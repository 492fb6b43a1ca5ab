//! Device capability interface.
//!
//! Every sensor driver (heart rate, power, trainer, ...) is recovered through
//! this trait. The orchestrator never sees protocol details, only the
//! connection state and the two cleanup operations.

use crate::domain::errors::DeviceError;
use crate::domain::role::DeviceRole;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Transport-level connection state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

/// A managed wireless sensor.
///
/// Implementations are process-wide singletons shared through the registry.
/// Recovery runs are not serialized against each other, so `disconnect` and
/// `forget` may be invoked concurrently on the same instance and must be
/// idempotent: calling either twice leaves the same end state as calling it once.
#[async_trait]
pub trait Device: Send + Sync {
    /// The role this device fills.
    fn role(&self) -> DeviceRole;

    /// Name shown to the user.
    fn display_name(&self) -> String;

    /// Current transport state. Must not block.
    fn connection_state(&self) -> ConnectionState;

    fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    /// Close the link. Succeeds trivially when already disconnected.
    async fn disconnect(&self) -> Result<(), DeviceError>;

    /// Drop any cached identity or bond so the next scan treats the
    /// peripheral as unknown.
    async fn forget(&self) -> Result<(), DeviceError>;
}
