//! Active control domain.

use std::fmt;

/// Which quantity the controller is currently driving. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMode {
    #[default]
    Idle,
    Position,
    Velocity,
    VoltageOverride,
}

impl ControlMode {
    /// Stable numeric code used on the telemetry surface.
    pub const fn code(self) -> u8 {
        match self {
            ControlMode::Idle => 0,
            ControlMode::Position => 1,
            ControlMode::Velocity => 2,
            ControlMode::VoltageOverride => 3,
        }
    }

    /// True for modes that regulate a measured quantity.
    pub const fn is_closed_loop(self) -> bool {
        matches!(self, ControlMode::Position | ControlMode::Velocity)
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ControlMode::Idle => "idle",
            ControlMode::Position => "position",
            ControlMode::Velocity => "velocity",
            ControlMode::VoltageOverride => "voltage",
        };
        f.write_str(s)
    }
}
