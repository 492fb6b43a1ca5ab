use anyhow::Result;
use sensor_recovery::domain::models::{AppEvent, MessageSeverity};
use sensor_recovery::domain::registry::DeviceRegistry;
use sensor_recovery::domain::role::RecoveryTarget;
use sensor_recovery::domain::settings::SettingsService;
use sensor_recovery::infrastructure::bluetooth::BondedSensor;
use sensor_recovery::infrastructure::logging::init_logger;
use sensor_recovery::infrastructure::platform::LocalPlatform;
use sensor_recovery::infrastructure::scheduler::DeferredCallbacks;
use sensor_recovery::recovery::{RecoveryConfig, RecoveryOrchestrator};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{info, warn};

const USAGE: &str = "Usage: sensor-recovery [ROLE|all] [--json]

Roles: trainer, hrm, power, cadence, moxy, core";

struct Args {
    target: RecoveryTarget,
    json: bool,
}

fn parse_args() -> Result<Option<Args>> {
    let mut args = Args {
        target: RecoveryTarget::All,
        json: false,
    };
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--json" => args.json = true,
            other => args.target = other.parse()?,
        }
    }
    Ok(Some(args))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{}", USAGE);
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            return Ok(ExitCode::from(2));
        }
    };

    let settings = Arc::new(Mutex::new(SettingsService::new()?));
    let (log_settings, recovery_settings, sensors) = {
        let guard = settings
            .lock()
            .map_err(|_| anyhow::anyhow!("Lock error"))?;
        let s = guard.get();
        (s.log_settings.clone(), s.recovery.clone(), s.sensors.clone())
    };
    let _log_guard = init_logger(&log_settings)?;
    info!("Starting sensor recovery for {}", args.target);

    let (event_sender, mut events) = mpsc::unbounded_channel();

    let mut registry = DeviceRegistry::new();
    for entry in &sensors {
        let sensor = BondedSensor::from_entry(entry, settings.clone())
            .with_event_sender(event_sender.clone());
        if let Err(e) = registry.register(Arc::new(sensor)) {
            warn!("Ignoring sensor {}: {}", entry.name, e);
        }
    }

    let orchestrator = RecoveryOrchestrator::new(
        Arc::new(registry),
        Arc::new(LocalPlatform::from_user_dirs(&recovery_settings)),
    )
    .with_config(RecoveryConfig::from(&recovery_settings))
    .with_callbacks(DeferredCallbacks::new())
    .with_event_sender(event_sender);

    let result = orchestrator.recover(args.target).await;
    // Drops every sender so the drain below terminates
    drop(orchestrator);

    while let Some(event) = events.recv().await {
        match event {
            AppEvent::RecoveryStarted(_) => {}
            AppEvent::LogMessage(message) => info!("{}", message.message),
            AppEvent::RecoveryFinished(report) => {
                let summary = report.summary();
                match summary.severity {
                    MessageSeverity::Success => println!("{}", summary.message),
                    _ => eprintln!("{}", summary.message),
                }
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
            }
        }
    }

    match result {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
