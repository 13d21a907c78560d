//! Maps `Box<dyn Error>` from the hardware boundary to typed `ActuatorError`.
//!
//! `ActuatorHardware` returns `Box<dyn Error + Send + Sync>` so any backend can
//! plug in; this module classifies those, with an optional feature-gated path
//! for `actuator_hardware::HwError` downcasting.

use crate::error::ActuatorError;

/// Map a hardware-boundary error to a typed `ActuatorError`.
///
/// Known hardware error types are downcast first, then string heuristics apply.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> ActuatorError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<actuator_hardware::error::HwError>() {
            return match hw {
                actuator_hardware::error::HwError::Timeout => ActuatorError::Timeout,
                other => ActuatorError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        ActuatorError::Timeout
    } else {
        ActuatorError::Hardware(s)
    }
}

/// Convenience wrapper for boxed trait-boundary errors.
pub(crate) fn map_boxed(e: Box<dyn std::error::Error + Send + Sync>) -> eyre::Report {
    eyre::Report::new(map_hw_error(&*e))
}
