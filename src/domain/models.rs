use crate::domain::report::RecoveryReport;
use crate::domain::role::RecoveryTarget;

/// Notifications published on the application event bus.
#[derive(Debug, Clone)]
pub enum AppEvent {
    RecoveryStarted(RecoveryTarget),
    RecoveryFinished(Box<RecoveryReport>),
    LogMessage(StatusMessage),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub message: String,
    pub severity: MessageSeverity,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>, severity: MessageSeverity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Warning,
    Error,
}
