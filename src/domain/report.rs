//! Recovery report.
//!
//! The report is the only observable contract of a recovery run: the
//! notification layer renders it and it serializes to JSON for logs.

use crate::domain::models::{MessageSeverity, StatusMessage};
use crate::domain::platform::StorageScope;
use crate::domain::role::{DeviceRole, RecoveryTarget};
use serde::{Deserialize, Serialize};

/// Result of one per-target operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum StepOutcome {
    /// Not attempted yet.
    Pending,
    /// Nothing to do, e.g. disconnecting a device that was not connected.
    NotNeeded,
    Succeeded,
    Failed(String),
}

impl StepOutcome {
    pub fn from_result<E: std::fmt::Display>(result: &Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::Succeeded,
            Err(e) => Self::Failed(e.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Progress of a single target through a run. Every target ends in `Done`;
/// failures are carried in the step outcomes, never retried within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStage {
    Targeted,
    Disconnected,
    Forgotten,
    SweptOrSkipped,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOutcome {
    pub role: DeviceRole,
    pub display_name: String,
    /// Connection state observed when the run started.
    pub was_connected: bool,
    pub disconnect: StepOutcome,
    pub forget: StepOutcome,
    pub stage: TargetStage,
}

impl TargetOutcome {
    pub fn new(role: DeviceRole, display_name: impl Into<String>, was_connected: bool) -> Self {
        Self {
            role,
            display_name: display_name.into(),
            was_connected,
            disconnect: if was_connected {
                StepOutcome::Pending
            } else {
                StepOutcome::NotNeeded
            },
            forget: StepOutcome::Pending,
            stage: TargetStage::Targeted,
        }
    }

    pub fn succeeded(&self) -> bool {
        !self.disconnect.is_failed() && !self.forget.is_failed()
    }
}

/// One platform sweep sub-step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "step")]
pub enum SweepStepKind {
    ListPairings,
    DisconnectPairing { name: String },
    ForgetPairing { name: String },
    PersistedKeys { scope: StorageScope },
    StructuredCaches,
    ListDatabases,
    DeleteDatabase { name: String },
}

impl std::fmt::Display for SweepStepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ListPairings => write!(f, "list pairings"),
            Self::DisconnectPairing { name } => write!(f, "disconnect pairing '{}'", name),
            Self::ForgetPairing { name } => write!(f, "forget pairing '{}'", name),
            Self::PersistedKeys { scope } => write!(f, "purge {:?} keys", scope),
            Self::StructuredCaches => write!(f, "purge caches"),
            Self::ListDatabases => write!(f, "list databases"),
            Self::DeleteDatabase { name } => write!(f, "delete database '{}'", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SweepStatus {
    /// Ran; `affected` counts removed keys, closed sessions and so on.
    Completed { affected: usize },
    /// The capability does not exist on this platform.
    Unavailable,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepStep {
    pub kind: SweepStepKind,
    pub status: SweepStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub steps: Vec<SweepStep>,
}

impl SweepReport {
    pub fn record(&mut self, kind: SweepStepKind, status: SweepStatus) {
        self.steps.push(SweepStep { kind, status });
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &SweepStep> {
        self.steps
            .iter()
            .filter(|s| matches!(s.status, SweepStatus::Failed { .. }))
    }

    pub fn unavailable_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == SweepStatus::Unavailable)
            .count()
    }

    pub fn status_of(&self, kind: &SweepStepKind) -> Option<&SweepStatus> {
        self.steps.iter().find(|s| &s.kind == kind).map(|s| &s.status)
    }
}

/// Result of the deferred-callback cleanup. Heuristic only: finding nothing
/// to clear is not a failure.
///
/// `available` is false when no callback registry was attached to the run,
/// so an empty cleanup can be told apart from a missing one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerCleanup {
    #[serde(default)]
    pub available: bool,
    pub scanned: u64,
    pub cleared: usize,
}

impl SchedulerCleanup {
    pub fn unavailable() -> Self {
        Self::default()
    }
}

/// A contained failure, as surfaced in the aggregate report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryFailure {
    DisconnectFailed { role: DeviceRole, reason: String },
    ForgetFailed { role: DeviceRole, reason: String },
    PlatformSweepSubStepFailed { step: SweepStepKind, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryReport {
    pub target: RecoveryTarget,
    pub targets: Vec<TargetOutcome>,
    pub sweep: SweepReport,
    pub scheduler: SchedulerCleanup,
    pub elapsed_ms: u64,
}

impl RecoveryReport {
    pub fn new(target: RecoveryTarget, targets: Vec<TargetOutcome>) -> Self {
        Self {
            target,
            targets,
            sweep: SweepReport::default(),
            scheduler: SchedulerCleanup::unavailable(),
            elapsed_ms: 0,
        }
    }

    pub fn outcome(&self, role: DeviceRole) -> Option<&TargetOutcome> {
        self.targets.iter().find(|t| t.role == role)
    }

    pub fn failures(&self) -> Vec<RecoveryFailure> {
        let mut failures = Vec::new();
        for target in &self.targets {
            if let Some(reason) = target.disconnect.failure_reason() {
                failures.push(RecoveryFailure::DisconnectFailed {
                    role: target.role,
                    reason: reason.to_string(),
                });
            }
            if let Some(reason) = target.forget.failure_reason() {
                failures.push(RecoveryFailure::ForgetFailed {
                    role: target.role,
                    reason: reason.to_string(),
                });
            }
        }
        for step in self.sweep.failed_steps() {
            if let SweepStatus::Failed { reason } = &step.status {
                failures.push(RecoveryFailure::PlatformSweepSubStepFailed {
                    step: step.kind.clone(),
                    reason: reason.clone(),
                });
            }
        }
        failures
    }

    pub fn is_success(&self) -> bool {
        self.failures().is_empty()
    }

    /// True when the targeted devices exist but none was connected.
    pub fn was_clean(&self) -> bool {
        self.targets.iter().all(|t| !t.was_connected)
    }

    /// Single user-facing message for the whole run.
    pub fn summary(&self) -> StatusMessage {
        let subject = match self.target {
            RecoveryTarget::All => "all devices".to_string(),
            RecoveryTarget::Role(role) => role.label().to_string(),
        };
        let hint = "If a sensor still won't reconnect, restart the app or turn Bluetooth off and on again.";
        let failures = self.failures().len();
        if failures == 0 {
            StatusMessage::new(
                format!("Reset {} complete. {}", subject, hint),
                MessageSeverity::Success,
            )
        } else {
            StatusMessage::new(
                format!(
                    "Reset {} finished with {} problem(s). {}",
                    subject, failures, hint
                ),
                MessageSeverity::Warning,
            )
        }
    }
}
