//! Ghost-pairing recovery.
//!
//! - [`orchestrator`] - The five-phase reset protocol
//! - [`sweep`] - Platform cache sweep (phase 3)

pub mod orchestrator;
pub mod sweep;

pub use orchestrator::{RecoveryConfig, RecoveryOrchestrator};
