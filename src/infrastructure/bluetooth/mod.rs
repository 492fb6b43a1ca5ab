//! Bluetooth Module
//!
//! Device-side and OS-side pieces of ghost-pairing recovery.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  RecoveryOrchestrator                    │
//! └──────────────┬───────────────────────────┬──────────────┘
//!                │ Device                    │ PlatformCaches
//!                ▼                           ▼
//!        ┌──────────────┐            ┌───────────────┐
//!        │ BondedSensor │            │ LocalPlatform │
//!        │              │            │               │
//!        │ - link state │            │ - stores      │
//!        │ - bond addr  │            │ - caches      │
//!        └──────────────┘            └───────┬───────┘
//!                                            │ PairingCache
//!                                            ▼
//!                                    ┌───────────────┐
//!                                    │   WinRT       │
//!                                    │ (Windows only)│
//!                                    └───────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`sensor`] - Configured sensor with a remembered bond
//! - `pairing` - OS pairing cache through WinRT (Windows only)

#[cfg(windows)]
pub mod pairing;
pub mod sensor;

use crate::domain::errors::SweepError;
use crate::domain::platform::PairingRecord;
use async_trait::async_trait;

pub use sensor::BondedSensor;

/// Pairing records held by the operating system's Bluetooth stack.
#[async_trait]
pub trait PairingCache: Send + Sync {
    /// Paired Bluetooth LE devices known to the OS.
    async fn list(&self) -> Result<Vec<PairingRecord>, SweepError>;

    /// Close the OS-level session if it is connected. Yields `true` if it was.
    async fn disconnect_if_live(&self, record: &PairingRecord) -> Result<bool, SweepError>;

    /// Whether [`unpair`](Self::unpair) is available to this process.
    fn supports_unpair(&self) -> bool {
        true
    }

    async fn unpair(&self, record: &PairingRecord) -> Result<(), SweepError>;
}
