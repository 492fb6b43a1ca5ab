//! Sensor roles and recovery targets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of sensor roles a training session can pair with.
///
/// Exactly one device exists per role for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceRole {
    /// Smart trainer accepting resistance/ERG control.
    Controllable,
    HeartRateMonitor,
    PowerMeter,
    SpeedCadenceSensor,
    /// Muscle-oxygen (SmO2) sensor.
    Moxy,
    /// Core body temperature sensor.
    CoreTemp,
}

impl DeviceRole {
    /// Every role, in registry order.
    pub const ALL: [DeviceRole; 6] = [
        Self::Controllable,
        Self::HeartRateMonitor,
        Self::PowerMeter,
        Self::SpeedCadenceSensor,
        Self::Moxy,
        Self::CoreTemp,
    ];

    /// Stable machine name, used in settings files and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Controllable => "controllable",
            Self::HeartRateMonitor => "heart_rate_monitor",
            Self::PowerMeter => "power_meter",
            Self::SpeedCadenceSensor => "speed_cadence_sensor",
            Self::Moxy => "moxy",
            Self::CoreTemp => "core_temp",
        }
    }

    /// Human-readable label for status messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Controllable => "Trainer",
            Self::HeartRateMonitor => "Heart Rate Monitor",
            Self::PowerMeter => "Power Meter",
            Self::SpeedCadenceSensor => "Speed/Cadence Sensor",
            Self::Moxy => "Moxy",
            Self::CoreTemp => "CORE Temperature",
        }
    }
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown device role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for DeviceRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "controllable" | "trainer" => Ok(Self::Controllable),
            "heart_rate_monitor" | "heartrate" | "hrm" | "hr" => Ok(Self::HeartRateMonitor),
            "power_meter" | "power" | "pm" => Ok(Self::PowerMeter),
            "speed_cadence_sensor" | "speed_cadence" | "cadence" | "speed" => {
                Ok(Self::SpeedCadenceSensor)
            }
            "moxy" | "smo2" => Ok(Self::Moxy),
            "core_temp" | "core" => Ok(Self::CoreTemp),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// Which devices a recovery run should act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "target", content = "role")]
pub enum RecoveryTarget {
    All,
    Role(DeviceRole),
}

impl fmt::Display for RecoveryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Role(role) => fmt::Display::fmt(role, f),
        }
    }
}

impl FromStr for RecoveryTarget {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse().map(Self::Role)
    }
}

impl From<DeviceRole> for RecoveryTarget {
    fn from(role: DeviceRole) -> Self {
        Self::Role(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_names_round_trip() {
        for role in DeviceRole::ALL {
            assert_eq!(role.as_str().parse::<DeviceRole>(), Ok(role));
        }
    }

    #[test]
    fn test_role_aliases() {
        assert_eq!("HRM".parse::<DeviceRole>(), Ok(DeviceRole::HeartRateMonitor));
        assert_eq!("speed-cadence".parse::<DeviceRole>(), Ok(DeviceRole::SpeedCadenceSensor));
        assert_eq!("trainer".parse::<DeviceRole>(), Ok(DeviceRole::Controllable));
        assert!("treadmill".parse::<DeviceRole>().is_err());
    }

    #[test]
    fn test_target_parse() {
        assert_eq!("All".parse::<RecoveryTarget>(), Ok(RecoveryTarget::All));
        assert_eq!(
            "power".parse::<RecoveryTarget>(),
            Ok(RecoveryTarget::Role(DeviceRole::PowerMeter))
        );
    }

    #[test]
    fn test_target_serializes_tagged() {
        let json = serde_json::to_string(&RecoveryTarget::Role(DeviceRole::Moxy)).unwrap();
        assert_eq!(json, r#"{"target":"role","role":"moxy"}"#);
    }
}
