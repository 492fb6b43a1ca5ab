use crate::domain::role::DeviceRole;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_false")]
    pub show_file_line: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_false(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

/// Tunables for the recovery protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoverySettings {
    /// Wait after disconnects settle, before any forget is issued.
    #[serde(default = "default_disconnect_settle_ms")]
    pub disconnect_settle_ms: u64,
    /// Wait before the run reports completion.
    #[serde(default = "default_completion_settle_ms")]
    pub completion_settle_ms: u64,
    /// Deferred-callback handles 1..=limit are cleared after the sweep.
    #[serde(default = "default_scheduler_sweep_limit")]
    pub scheduler_sweep_limit: u64,
    #[serde(default = "default_name_patterns")]
    pub storage_key_patterns: Vec<String>,
    #[serde(default = "default_name_patterns")]
    pub database_name_patterns: Vec<String>,
    /// Cache namespaces to clear. Empty clears every namespace.
    #[serde(default)]
    pub cache_namespaces: Vec<String>,
}

impl Default for RecoverySettings {
    fn default() -> Self {
        Self {
            disconnect_settle_ms: default_disconnect_settle_ms(),
            completion_settle_ms: default_completion_settle_ms(),
            scheduler_sweep_limit: default_scheduler_sweep_limit(),
            storage_key_patterns: default_name_patterns(),
            database_name_patterns: default_name_patterns(),
            cache_namespaces: Vec::new(),
        }
    }
}

/// A sensor the user has set up for a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorEntry {
    pub role: DeviceRole,
    pub name: String,
    /// Bluetooth address remembered from the last successful pairing.
    #[serde(default)]
    pub address: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub log_settings: LogSettings,
    #[serde(default)]
    pub recovery: RecoverySettings,
    #[serde(default)]
    pub sensors: Vec<SensorEntry>,
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "sensor_recovery".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}
fn default_disconnect_settle_ms() -> u64 {
    500
}
fn default_completion_settle_ms() -> u64 {
    1000
}
fn default_scheduler_sweep_limit() -> u64 {
    1000
}
fn default_name_patterns() -> Vec<String> {
    vec!["bluetooth".into(), "ble".into(), "device".into()]
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Ok(Self::open(settings_path))
    }

    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn open(settings_path: PathBuf) -> Self {
        let settings = match Self::load_from_file(&settings_path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::debug!(
                    "Using default settings ({}): {}",
                    settings_path.display(),
                    e
                );
                Settings::default()
            }
        };

        Self {
            settings,
            settings_path,
        }
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("SensorRecovery");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn sensor(&self, role: DeviceRole) -> Option<&SensorEntry> {
        self.settings.sensors.iter().find(|s| s.role == role)
    }

    /// Record the address a sensor paired with.
    pub fn remember_address(&mut self, role: DeviceRole, address: u64) -> anyhow::Result<()> {
        match self.settings.sensors.iter_mut().find(|s| s.role == role) {
            Some(entry) if entry.address == Some(address) => return Ok(()),
            Some(entry) => entry.address = Some(address),
            None => anyhow::bail!("No sensor configured for {}", role),
        }
        self.save()
    }

    /// Drop the remembered address for `role`. Saving is skipped when there
    /// is nothing to forget.
    pub fn forget_address(&mut self, role: DeviceRole) -> anyhow::Result<bool> {
        let Some(entry) = self.settings.sensors.iter_mut().find(|s| s.role == role) else {
            return Ok(false);
        };
        if entry.address.take().is_none() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }
}
