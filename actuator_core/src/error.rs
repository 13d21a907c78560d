use thiserror::Error;

/// Recoverable configuration problems. The offending call has no side effect
/// (or, for encoder programming, the previous configuration is retained).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("linear units requested but no radius is configured")]
    LinearUnconfigured,
    #[error("encoder configuration rejected: {0}")]
    InvalidEncoderConfig(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
}

/// Requests that would leave the actuator with an undefined command. These
/// abort the operation instead of driving hardware.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("closed-loop operation requires a configured encoder and an installed control law")]
    EncoderNotConfigured,
    #[error("arm feedforward cannot be combined with a linear actuator (radius is set)")]
    IncompatibleFeedforward,
    #[error("no control law installed")]
    NoControlLaw,
}

/// Failures reported by the hardware handle.
#[derive(Debug, Error, Clone)]
pub enum ActuatorError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("timeout talking to actuator")]
    Timeout,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("gear ratio must be positive and finite")]
    InvalidGearRatio,
    #[error("radius must be positive and finite")]
    InvalidRadius,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

/// Operation result; pure helpers name their typed error as `E`.
pub type Result<T, E = Report> = eyre::Result<T, E>;
pub use eyre::Report;
