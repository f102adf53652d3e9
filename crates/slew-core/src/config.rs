use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_control_dt() -> f64 {
    0.02
}
const fn default_default_speed() -> f32 {
    10.0
}
const fn default_resource_rate() -> f32 {
    0.0
}

// ---------------------------------------------------------------------------
// MotionConfig
// ---------------------------------------------------------------------------

/// Actuation configuration.
///
/// Shape constants of the motion profile (acceleration time, stop margin,
/// continuous sentinel) are compile-time constants in `slew-motion-core`;
/// this resource carries only host-tunable values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
pub struct MotionConfig {
    /// Fixed control timestep in seconds (default: 0.02 = 50 Hz).
    /// One actuator advance per tick.
    #[serde(default = "default_control_dt")]
    pub control_dt: f64,

    /// Speed (degrees/second) used when a rotation request does not name
    /// one (default: 10).
    #[serde(default = "default_default_speed")]
    pub default_speed: f32,

    /// Resource units consumed per second of active rotation (default: 0 =
    /// consumption disabled).  A zero grant mid-motion brakes the actuator.
    #[serde(default = "default_resource_rate")]
    pub resource_rate: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            control_dt: default_control_dt(),
            default_speed: default_default_speed(),
            resource_rate: default_resource_rate(),
        }
    }
}

impl MotionConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.control_dt <= 0.0 {
            return Err(ConfigError::InvalidControlDt(self.control_dt));
        }
        if self.default_speed <= 0.0 {
            return Err(ConfigError::InvalidDefaultSpeed(self.default_speed));
        }
        if self.resource_rate < 0.0 {
            return Err(ConfigError::InvalidResourceRate(self.resource_rate));
        }
        Ok(())
    }

    /// Control rate in Hz.
    pub fn control_hz(&self) -> f64 {
        1.0 / self.control_dt
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = MotionConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.control_dt - 0.02).abs() < f64::EPSILON);
        assert!((config.control_hz() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_positive_control_dt() {
        let config = MotionConfig {
            control_dt: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidControlDt(_))
        ));
    }

    #[test]
    fn rejects_non_positive_default_speed() {
        let config = MotionConfig {
            default_speed: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDefaultSpeed(_))
        ));
    }

    #[test]
    fn rejects_negative_resource_rate() {
        let config = MotionConfig {
            resource_rate: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidResourceRate(_))
        ));
    }

    #[test]
    fn zero_resource_rate_is_valid() {
        let config = MotionConfig {
            resource_rate: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config: MotionConfig = toml::from_str("control_dt = 0.01\n").unwrap();
        assert!((config.control_dt - 0.01).abs() < f64::EPSILON);
        assert!((config.default_speed - 10.0).abs() < f32::EPSILON);
        assert!((config.resource_rate - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn serde_round_trip() {
        let config = MotionConfig {
            control_dt: 0.005,
            default_speed: 45.0,
            resource_rate: 1.5,
        };
        let text = toml::to_string(&config).unwrap();
        let back: MotionConfig = toml::from_str(&text).unwrap();
        assert_eq!(config, back);
    }
}
