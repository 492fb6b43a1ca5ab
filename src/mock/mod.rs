//! Instrumented doubles for tests.
//!
//! [`MockDevice`] and [`MockPlatform`] append every call to a shared
//! [`CallLog`], so tests can assert on call counts and on the relative order
//! of calls across devices and phases.

mod device;
mod platform;

pub use device::MockDevice;
pub use platform::MockPlatform;

use crate::domain::role::DeviceRole;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    DisconnectStarted(DeviceRole),
    DisconnectSettled(DeviceRole),
    ForgetStarted(DeviceRole),
    ForgetSettled(DeviceRole),
    /// A platform capability was invoked, e.g. `"delete_database:ble"`.
    Platform(String),
}

#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, call: Call) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn is_empty(&self) -> bool {
        self.calls().is_empty()
    }

    pub fn disconnects(&self) -> Vec<DeviceRole> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::DisconnectStarted(role) => Some(role),
                _ => None,
            })
            .collect()
    }

    pub fn forgets(&self) -> Vec<DeviceRole> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::ForgetStarted(role) => Some(role),
                _ => None,
            })
            .collect()
    }

    pub fn platform_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Platform(op) => Some(op),
                _ => None,
            })
            .collect()
    }

    /// Position of the first call matching `predicate`.
    pub fn position(&self, predicate: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls().iter().position(predicate)
    }

    /// Position of the last call matching `predicate`.
    pub fn last_position(&self, predicate: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls().iter().rposition(predicate)
    }
}
