//! Wireless sensor recovery.
//!
//! Training sessions pair with up to six sensors (trainer, heart rate, power,
//! speed/cadence, muscle oxygen, core temperature). When the OS or app keeps
//! pairing state for a peripheral that is no longer reachable, reconnection
//! fails until that state is purged. [`RecoveryOrchestrator`] disconnects,
//! forgets and sweeps cached state for one role or for every registered
//! device, and reports what happened in a [`RecoveryReport`].

pub mod domain;
pub mod infrastructure;
pub mod mock;
pub mod recovery;

pub use domain::device::{ConnectionState, Device};
pub use domain::errors::{DeviceError, RecoveryError, SweepError};
pub use domain::registry::DeviceRegistry;
pub use domain::report::RecoveryReport;
pub use domain::role::{DeviceRole, RecoveryTarget};
pub use recovery::{RecoveryConfig, RecoveryOrchestrator};
