//! Runtime configuration types for `ActuatorController`.
//!
//! These are separate from the TOML-deserialized config in `actuator_config`;
//! see `conversions` for the bridge.

use std::time::Duration;

use crate::error::ConfigurationError;

/// Correction (PID) gains. Output is volts per unit of error.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Gains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Gains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite()) {
            return Err(ConfigurationError::InvalidConfiguration(
                "gains must be finite",
            ));
        }
        Ok(())
    }
}

/// Motion constraints in output-shaft units (rad/s, rad/s^2).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraints {
    pub max_velocity: f64,
    pub max_acceleration: f64,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            max_velocity: 1.0,
            max_acceleration: 1.0,
        }
    }
}

impl Constraints {
    pub const fn new(max_velocity: f64, max_acceleration: f64) -> Self {
        Self {
            max_velocity,
            max_acceleration,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let ok = |x: f64| x.is_finite() && x > 0.0;
        if !ok(self.max_velocity) {
            return Err(ConfigurationError::InvalidConfiguration(
                "max_velocity must be positive and finite",
            ));
        }
        if !ok(self.max_acceleration) {
            return Err(ConfigurationError::InvalidConfiguration(
                "max_acceleration must be positive and finite",
            ));
        }
        Ok(())
    }
}

/// Periodic loop timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopCfg {
    /// Control tick driven by the host.
    pub tick: Duration,
    /// Follower synchronization period.
    pub follower_sync: Duration,
}

impl Default for LoopCfg {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(20),
            follower_sync: Duration::from_millis(5),
        }
    }
}

/// Default symmetric output limit (volts) for a 12 V bus.
pub const DEFAULT_MAX_OUTPUT_VOLTAGE: f64 = 12.0;
