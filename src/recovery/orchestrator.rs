//! Recovery Orchestrator
//!
//! Clears ghost pairings for one or all sensors. Stale state can sit in any of
//! several layers (the app's connection object, the driver's bond cache, the
//! OS pairing cache, persisted app storage), so a run walks five fixed phases:
//!
//! 1. disconnect every connected target, then wait [`DISCONNECT_SETTLE`]
//! 2. forget every target
//! 3. sweep platform caches
//! 4. clear pending deferred callbacks
//! 5. wait [`COMPLETION_SETTLE`] and report
//!
//! Work inside a phase runs concurrently across targets; a phase starts only
//! after every operation of the previous one has settled. Failures are
//! contained per target or per sub-step and recorded in the report.
//!
//! A run cannot be cancelled once started, and overlapping runs are not
//! serialized: devices must tolerate concurrent `disconnect`/`forget` calls.

use crate::domain::device::Device;
use crate::domain::errors::{DeviceError, RecoveryError, Result};
use crate::domain::models::{AppEvent, MessageSeverity};
use crate::domain::platform::{NameFilter, PlatformCaches};
use crate::domain::registry::DeviceRegistry;
use crate::domain::report::{
    RecoveryReport, SchedulerCleanup, StepOutcome, TargetOutcome, TargetStage,
};
use crate::domain::role::RecoveryTarget;
use crate::domain::settings::RecoverySettings;
use crate::infrastructure::scheduler::DeferredCallbacks;
use crate::recovery::sweep::{sweep_platform, SweepFilters};
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Lets the transport flush disconnect notifications before a forget is
/// issued. Found by trial on mobile stacks; may be stale on newer releases.
pub const DISCONNECT_SETTLE: Duration = Duration::from_millis(500);

/// Final wait before the run reports completion.
pub const COMPLETION_SETTLE: Duration = Duration::from_secs(1);

/// Deferred-callback handles `1..=SCHEDULER_SWEEP_LIMIT` are cleared.
pub const SCHEDULER_SWEEP_LIMIT: u64 = 1000;

#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    pub disconnect_settle: Duration,
    pub completion_settle: Duration,
    pub scheduler_sweep_limit: u64,
    pub filters: SweepFilters,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self::from(&RecoverySettings::default())
    }
}

impl From<&RecoverySettings> for RecoveryConfig {
    fn from(settings: &RecoverySettings) -> Self {
        Self {
            disconnect_settle: Duration::from_millis(settings.disconnect_settle_ms),
            completion_settle: Duration::from_millis(settings.completion_settle_ms),
            scheduler_sweep_limit: settings.scheduler_sweep_limit,
            filters: SweepFilters {
                storage_keys: NameFilter::new(&settings.storage_key_patterns),
                databases: NameFilter::new(&settings.database_name_patterns),
            },
        }
    }
}

impl RecoveryConfig {
    /// No settle waits. For tests and for callers that already waited.
    pub fn without_delays(mut self) -> Self {
        self.disconnect_settle = Duration::ZERO;
        self.completion_settle = Duration::ZERO;
        self
    }
}

pub struct RecoveryOrchestrator {
    registry: Arc<DeviceRegistry>,
    platform: Arc<dyn PlatformCaches>,
    callbacks: Option<Arc<DeferredCallbacks>>,
    config: RecoveryConfig,
    event_sender: Option<mpsc::UnboundedSender<AppEvent>>,
}

/// Run one per-target operation, turning both errors and panics into a
/// failed outcome.
async fn contained(
    operation: BoxFuture<'_, std::result::Result<(), DeviceError>>,
) -> StepOutcome {
    match AssertUnwindSafe(operation).catch_unwind().await {
        Ok(result) => StepOutcome::from_result(&result),
        Err(_) => StepOutcome::Failed("operation panicked".to_string()),
    }
}

impl RecoveryOrchestrator {
    pub fn new(registry: Arc<DeviceRegistry>, platform: Arc<dyn PlatformCaches>) -> Self {
        Self {
            registry,
            platform,
            callbacks: None,
            config: RecoveryConfig::default(),
            event_sender: None,
        }
    }

    pub fn with_config(mut self, config: RecoveryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_callbacks(mut self, callbacks: Arc<DeferredCallbacks>) -> Self {
        self.callbacks = Some(callbacks);
        self
    }

    pub fn with_event_sender(mut self, sender: mpsc::UnboundedSender<AppEvent>) -> Self {
        self.event_sender = Some(sender);
        self
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Disconnect, forget and purge cached state for `target`.
    ///
    /// # Errors
    ///
    /// Only [`RecoveryError::NoMatchingDevice`], when a specific role was
    /// requested and nothing is registered for it. No device is touched in
    /// that case. Every other failure is recorded in the report.
    pub async fn recover(&self, target: impl Into<RecoveryTarget>) -> Result<RecoveryReport> {
        let target = target.into();
        let started = Instant::now();

        let devices = self.registry.resolve(target);
        if devices.is_empty() {
            match target {
                RecoveryTarget::Role(role) => {
                    error!("Cannot reset {}: no device registered", role);
                    return Err(RecoveryError::NoMatchingDevice { role });
                }
                RecoveryTarget::All => {
                    warn!("No devices registered; sweeping platform caches only")
                }
            }
        }

        info!(
            "Starting device reset for {} ({} target(s))",
            target,
            devices.len()
        );
        self.send_event(AppEvent::RecoveryStarted(target));

        let mut outcomes: Vec<TargetOutcome> = devices
            .iter()
            .map(|d| TargetOutcome::new(d.role(), d.display_name(), d.is_connected()))
            .collect();

        self.disconnect_phase(&devices, &mut outcomes).await;
        self.forget_phase(&devices, &mut outcomes).await;

        info!("Phase 3: sweeping platform caches");
        let sweep = sweep_platform(self.platform.as_ref(), &self.config.filters).await;
        advance(&mut outcomes, TargetStage::SweptOrSkipped);

        let scheduler = self.clear_deferred_callbacks();

        info!("Phase 5: settling for {:?}", self.config.completion_settle);
        tokio::time::sleep(self.config.completion_settle).await;
        advance(&mut outcomes, TargetStage::Done);

        let mut report = RecoveryReport::new(target, outcomes);
        report.sweep = sweep;
        report.scheduler = scheduler;
        report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let summary = report.summary();
        match summary.severity {
            MessageSeverity::Success => info!("{}", summary.message),
            _ => warn!("{} ({:?})", summary.message, report.failures()),
        }
        self.send_event(AppEvent::RecoveryFinished(Box::new(report.clone())));

        Ok(report)
    }

    /// Phase 1. The [`DISCONNECT_SETTLE`] wait only runs when at least one
    /// target was connected: with nothing disconnected there are no
    /// notifications to flush, so the barrier is followed directly by phase 2.
    async fn disconnect_phase(
        &self,
        devices: &[Arc<dyn Device>],
        outcomes: &mut [TargetOutcome],
    ) {
        let connected: Vec<usize> = outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| o.was_connected)
            .map(|(i, _)| i)
            .collect();
        info!("Phase 1: disconnecting {} connected device(s)", connected.len());

        let results =
            join_all(connected.iter().map(|&i| contained(devices[i].disconnect()))).await;

        for (&i, outcome) in connected.iter().zip(results) {
            if let Some(reason) = outcome.failure_reason() {
                warn!("Disconnect failed for {}: {}", outcomes[i].display_name, reason);
            }
            outcomes[i].disconnect = outcome;
        }
        advance(outcomes, TargetStage::Disconnected);

        if !connected.is_empty() {
            tokio::time::sleep(self.config.disconnect_settle).await;
        }
    }

    async fn forget_phase(&self, devices: &[Arc<dyn Device>], outcomes: &mut [TargetOutcome]) {
        info!("Phase 2: forgetting {} device(s)", devices.len());

        let results = join_all(devices.iter().map(|d| contained(d.forget()))).await;

        for (outcome, result) in outcomes.iter_mut().zip(results) {
            if let Some(reason) = result.failure_reason() {
                warn!("Forget failed for {}: {}", outcome.display_name, reason);
            }
            outcome.forget = result;
        }
        advance(outcomes, TargetStage::Forgotten);
    }

    fn clear_deferred_callbacks(&self) -> SchedulerCleanup {
        let Some(callbacks) = &self.callbacks else {
            info!("Phase 4: no deferred-callback registry attached");
            return SchedulerCleanup::unavailable();
        };
        let limit = self.config.scheduler_sweep_limit;
        let cleared = callbacks.clear_range(1..=limit);
        info!("Phase 4: cleared {} pending callback(s)", cleared);
        SchedulerCleanup {
            available: true,
            scanned: limit,
            cleared,
        }
    }

    fn send_event(&self, event: AppEvent) {
        if let Some(sender) = &self.event_sender {
            let _ = sender.send(event);
        }
    }
}

fn advance(outcomes: &mut [TargetOutcome], stage: TargetStage) {
    for outcome in outcomes {
        outcome.stage = stage;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::device::ConnectionState;
    use crate::domain::platform::{NoPlatformCaches, StorageScope};
    use crate::domain::report::RecoveryFailure;
    use crate::domain::role::DeviceRole;
    use crate::mock::{Call, CallLog, MockDevice, MockPlatform};
    use async_trait::async_trait;

    fn orchestrator(devices: Vec<MockDevice>, platform: MockPlatform) -> RecoveryOrchestrator {
        let mut registry = DeviceRegistry::new();
        for device in devices {
            registry.register(Arc::new(device)).unwrap();
        }
        RecoveryOrchestrator::new(Arc::new(registry), Arc::new(platform))
            .with_config(RecoveryConfig::default().without_delays())
    }

    #[tokio::test]
    async fn test_recover_single_role_touches_only_that_device() {
        let log = CallLog::new();
        let orchestrator = orchestrator(
            vec![
                MockDevice::new(DeviceRole::HeartRateMonitor, log.clone()).connected(),
                MockDevice::new(DeviceRole::PowerMeter, log.clone()),
            ],
            MockPlatform::unavailable(log.clone()),
        );

        let report = orchestrator
            .recover(DeviceRole::HeartRateMonitor)
            .await
            .unwrap();

        assert_eq!(log.disconnects(), vec![DeviceRole::HeartRateMonitor]);
        assert_eq!(log.forgets(), vec![DeviceRole::HeartRateMonitor]);
        assert!(!log.calls().iter().any(|c| matches!(
            c,
            Call::DisconnectStarted(DeviceRole::PowerMeter) | Call::ForgetStarted(DeviceRole::PowerMeter)
        )));

        let settled = log
            .position(|c| *c == Call::DisconnectSettled(DeviceRole::HeartRateMonitor))
            .unwrap();
        let forget = log
            .position(|c| *c == Call::ForgetStarted(DeviceRole::HeartRateMonitor))
            .unwrap();
        assert!(settled < forget);

        assert_eq!(report.targets.len(), 1);
        let hrm = report.outcome(DeviceRole::HeartRateMonitor).unwrap();
        assert_eq!(hrm.disconnect, StepOutcome::Succeeded);
        assert_eq!(hrm.forget, StepOutcome::Succeeded);
        assert_eq!(hrm.stage, TargetStage::Done);
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn test_failed_disconnect_still_forgets_target() {
        let log = CallLog::new();
        let orchestrator = orchestrator(
            vec![MockDevice::new(DeviceRole::Controllable, log.clone())
                .connected()
                .failing_disconnect("GATT error 133")],
            MockPlatform::unavailable(log.clone()),
        );

        let report = orchestrator.recover(DeviceRole::Controllable).await.unwrap();

        let trainer = report.outcome(DeviceRole::Controllable).unwrap();
        assert!(trainer.disconnect.is_failed());
        assert!(trainer
            .disconnect
            .failure_reason()
            .unwrap()
            .contains("GATT error 133"));
        assert_eq!(trainer.forget, StepOutcome::Succeeded);
        assert_eq!(log.forgets(), vec![DeviceRole::Controllable]);
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.summary().severity, MessageSeverity::Warning);
    }

    #[tokio::test]
    async fn test_failed_forget_does_not_block_siblings() {
        let log = CallLog::new();
        let orchestrator = orchestrator(
            vec![
                MockDevice::new(DeviceRole::HeartRateMonitor, log.clone())
                    .connected()
                    .failing_forget("bond locked"),
                MockDevice::new(DeviceRole::PowerMeter, log.clone()),
            ],
            MockPlatform::unavailable(log.clone()),
        );

        let report = orchestrator.recover(RecoveryTarget::All).await.unwrap();

        assert_eq!(
            log.forgets(),
            vec![DeviceRole::HeartRateMonitor, DeviceRole::PowerMeter]
        );
        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        match &failures[0] {
            RecoveryFailure::ForgetFailed { role, reason } => {
                assert_eq!(*role, DeviceRole::HeartRateMonitor);
                assert!(reason.contains("bond locked"));
            }
            other => panic!("unexpected failure: {:?}", other),
        }

        let hrm = report.outcome(DeviceRole::HeartRateMonitor).unwrap();
        assert_eq!(hrm.disconnect, StepOutcome::Succeeded);
        assert_eq!(hrm.stage, TargetStage::Done);
        let power = report.outcome(DeviceRole::PowerMeter).unwrap();
        assert_eq!(power.forget, StepOutcome::Succeeded);
        assert_eq!(power.stage, TargetStage::Done);
        assert_eq!(report.summary().severity, MessageSeverity::Warning);
    }

    #[tokio::test]
    async fn test_recover_all_disconnects_only_connected_devices() {
        let log = CallLog::new();
        let orchestrator = orchestrator(
            vec![
                MockDevice::new(DeviceRole::HeartRateMonitor, log.clone()).connected(),
                MockDevice::new(DeviceRole::PowerMeter, log.clone()).connected(),
                MockDevice::new(DeviceRole::SpeedCadenceSensor, log.clone()),
            ],
            MockPlatform::unavailable(log.clone()),
        );

        let report = orchestrator.recover(RecoveryTarget::All).await.unwrap();

        assert_eq!(log.disconnects().len(), 2);
        assert!(!log
            .disconnects()
            .contains(&DeviceRole::SpeedCadenceSensor));
        assert_eq!(log.forgets().len(), 3);
        assert_eq!(report.targets.len(), 3);
        assert_eq!(
            report
                .outcome(DeviceRole::SpeedCadenceSensor)
                .unwrap()
                .disconnect,
            StepOutcome::NotNeeded
        );
    }

    #[tokio::test]
    async fn test_unregistered_role_has_no_side_effects() {
        let log = CallLog::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let callbacks = DeferredCallbacks::new();
        callbacks.schedule(Duration::from_secs(60), || {});
        let orchestrator = orchestrator(
            vec![MockDevice::new(DeviceRole::HeartRateMonitor, log.clone()).connected()],
            MockPlatform::empty(log.clone()).with_databases(&["ble"]),
        )
        .with_callbacks(callbacks.clone())
        .with_event_sender(tx);

        let err = orchestrator.recover(DeviceRole::Moxy).await.unwrap_err();

        assert!(matches!(
            err,
            RecoveryError::NoMatchingDevice {
                role: DeviceRole::Moxy
            }
        ));
        assert!(log.is_empty());
        assert_eq!(callbacks.pending(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_forget_before_every_disconnect_settles() {
        let log = CallLog::new();
        let orchestrator = orchestrator(
            vec![
                MockDevice::new(DeviceRole::HeartRateMonitor, log.clone())
                    .connected()
                    .with_disconnect_delay(Duration::from_millis(300)),
                MockDevice::new(DeviceRole::PowerMeter, log.clone())
                    .connected()
                    .with_disconnect_delay(Duration::from_millis(10)),
                MockDevice::new(DeviceRole::Moxy, log.clone())
                    .connected()
                    .failing_disconnect("timeout")
                    .with_disconnect_delay(Duration::from_millis(150)),
                MockDevice::new(DeviceRole::CoreTemp, log.clone()),
            ],
            MockPlatform::unavailable(log.clone()),
        );

        orchestrator.recover(RecoveryTarget::All).await.unwrap();

        let last_settled = log
            .last_position(|c| matches!(c, Call::DisconnectSettled(_)))
            .unwrap();
        let first_forget = log
            .position(|c| matches!(c, Call::ForgetStarted(_)))
            .unwrap();
        assert!(last_settled < first_forget);
        assert_eq!(log.forgets().len(), 4);
    }

    #[tokio::test]
    async fn test_one_failed_disconnect_does_not_block_siblings() {
        let log = CallLog::new();
        let orchestrator = orchestrator(
            vec![
                MockDevice::new(DeviceRole::HeartRateMonitor, log.clone())
                    .connected()
                    .failing_disconnect("not reachable"),
                MockDevice::new(DeviceRole::PowerMeter, log.clone()).connected(),
            ],
            MockPlatform::unavailable(log.clone()),
        );

        let report = orchestrator.recover(RecoveryTarget::All).await.unwrap();

        assert_eq!(
            report.outcome(DeviceRole::PowerMeter).unwrap().disconnect,
            StepOutcome::Succeeded
        );
        assert_eq!(log.count(&Call::ForgetStarted(DeviceRole::HeartRateMonitor)), 1);
        assert_eq!(log.count(&Call::ForgetStarted(DeviceRole::PowerMeter)), 1);
    }

    #[tokio::test]
    async fn test_unavailable_platform_yields_no_sweep_failures() {
        let registry = Arc::new(DeviceRegistry::new());
        let orchestrator = RecoveryOrchestrator::new(registry, Arc::new(NoPlatformCaches))
            .with_config(RecoveryConfig::default().without_delays());

        let report = orchestrator.recover(RecoveryTarget::All).await.unwrap();

        assert_eq!(report.sweep.failed_steps().count(), 0);
        assert!(report.sweep.unavailable_count() > 0);
        assert!(report.is_success());
        assert!(report.was_clean());
    }

    #[tokio::test]
    async fn test_sweep_failures_are_reported_not_raised() {
        let log = CallLog::new();
        let orchestrator = orchestrator(
            vec![MockDevice::new(DeviceRole::PowerMeter, log.clone())],
            MockPlatform::empty(log.clone())
                .with_keys(StorageScope::Persistent, &["bleDevices"])
                .fail_on("purge_caches"),
        );

        let report = orchestrator.recover(DeviceRole::PowerMeter).await.unwrap();

        assert_eq!(report.sweep.failed_steps().count(), 1);
        assert_eq!(report.failures().len(), 1);
        assert!(log.platform_calls().contains(&"list_databases".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_delays_are_applied() {
        let log = CallLog::new();
        let mut registry = DeviceRegistry::new();
        registry
            .register(Arc::new(
                MockDevice::new(DeviceRole::HeartRateMonitor, log.clone()).connected(),
            ))
            .unwrap();
        let orchestrator = RecoveryOrchestrator::new(
            Arc::new(registry),
            Arc::new(MockPlatform::unavailable(log)),
        );

        let started = tokio::time::Instant::now();
        orchestrator
            .recover(DeviceRole::HeartRateMonitor)
            .await
            .unwrap();
        assert!(started.elapsed() >= DISCONNECT_SETTLE + COMPLETION_SETTLE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_settle_skipped_when_nothing_connected() {
        let log = CallLog::new();
        let mut registry = DeviceRegistry::new();
        registry
            .register(Arc::new(MockDevice::new(DeviceRole::Moxy, log.clone())))
            .unwrap();
        let orchestrator = RecoveryOrchestrator::new(
            Arc::new(registry),
            Arc::new(MockPlatform::unavailable(log)),
        );

        let started = tokio::time::Instant::now();
        orchestrator.recover(DeviceRole::Moxy).await.unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= COMPLETION_SETTLE);
        assert!(elapsed < DISCONNECT_SETTLE + COMPLETION_SETTLE);
    }

    #[tokio::test]
    async fn test_publishes_start_and_finish_events() {
        let log = CallLog::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let orchestrator = orchestrator(
            vec![MockDevice::new(DeviceRole::Moxy, log.clone())],
            MockPlatform::unavailable(log),
        )
        .with_event_sender(tx);

        orchestrator.recover(DeviceRole::Moxy).await.unwrap();

        assert!(matches!(
            rx.try_recv(),
            Ok(AppEvent::RecoveryStarted(RecoveryTarget::Role(DeviceRole::Moxy)))
        ));
        match rx.try_recv() {
            Ok(AppEvent::RecoveryFinished(report)) => {
                assert!(report.was_clean());
                assert_eq!(report.summary().severity, MessageSeverity::Success);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_clears_deferred_callbacks() {
        let log = CallLog::new();
        let callbacks = DeferredCallbacks::new();
        for _ in 0..3 {
            callbacks.schedule(Duration::from_secs(60), || {});
        }
        let orchestrator = orchestrator(
            vec![MockDevice::new(DeviceRole::CoreTemp, log.clone())],
            MockPlatform::unavailable(log),
        )
        .with_callbacks(callbacks.clone());

        let report = orchestrator.recover(RecoveryTarget::All).await.unwrap();

        assert!(report.scheduler.available);
        assert_eq!(report.scheduler.cleared, 3);
        assert_eq!(report.scheduler.scanned, SCHEDULER_SWEEP_LIMIT);
        assert_eq!(callbacks.pending(), 0);
    }

    #[tokio::test]
    async fn test_missing_callback_registry_is_reported_unavailable() {
        let log = CallLog::new();
        let orchestrator = orchestrator(
            vec![MockDevice::new(DeviceRole::CoreTemp, log.clone())],
            MockPlatform::unavailable(log),
        );

        let report = orchestrator.recover(RecoveryTarget::All).await.unwrap();

        assert_eq!(report.scheduler, SchedulerCleanup::unavailable());
        assert!(!report.scheduler.available);
        assert!(report.is_success());

        let callbacks = DeferredCallbacks::new();
        let report = orchestrator
            .with_callbacks(callbacks)
            .recover(RecoveryTarget::All)
            .await
            .unwrap();
        assert!(report.scheduler.available);
        assert_eq!(report.scheduler.cleared, 0);
    }

    struct PanickingDevice;

    #[async_trait]
    impl Device for PanickingDevice {
        fn role(&self) -> DeviceRole {
            DeviceRole::Controllable
        }

        fn display_name(&self) -> String {
            "Broken trainer".to_string()
        }

        fn connection_state(&self) -> ConnectionState {
            ConnectionState::Connected
        }

        async fn disconnect(&self) -> std::result::Result<(), DeviceError> {
            panic!("driver bug");
        }

        async fn forget(&self) -> std::result::Result<(), DeviceError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_panicking_driver_is_contained() {
        let log = CallLog::new();
        let mut registry = DeviceRegistry::new();
        registry.register(Arc::new(PanickingDevice)).unwrap();
        registry
            .register(Arc::new(
                MockDevice::new(DeviceRole::PowerMeter, log.clone()).connected(),
            ))
            .unwrap();
        let orchestrator = RecoveryOrchestrator::new(Arc::new(registry), Arc::new(NoPlatformCaches))
            .with_config(RecoveryConfig::default().without_delays());

        let report = orchestrator.recover(RecoveryTarget::All).await.unwrap();

        let trainer = report.outcome(DeviceRole::Controllable).unwrap();
        assert_eq!(
            trainer.disconnect,
            StepOutcome::Failed("operation panicked".to_string())
        );
        assert_eq!(trainer.forget, StepOutcome::Succeeded);
        assert_eq!(log.disconnects(), vec![DeviceRole::PowerMeter]);
    }

    #[tokio::test]
    async fn test_overlapping_runs_both_complete() {
        let log = CallLog::new();
        let orchestrator = orchestrator(
            vec![
                MockDevice::new(DeviceRole::HeartRateMonitor, log.clone()).connected(),
                MockDevice::new(DeviceRole::PowerMeter, log.clone()),
            ],
            MockPlatform::unavailable(log.clone()),
        );

        let (first, second) = tokio::join!(
            orchestrator.recover(RecoveryTarget::All),
            orchestrator.recover(DeviceRole::HeartRateMonitor)
        );

        assert!(first.unwrap().is_success());
        assert!(second.unwrap().is_success());
        assert_eq!(log.forgets().len(), 3);
    }
}
