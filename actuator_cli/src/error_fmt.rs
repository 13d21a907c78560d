//! Human-readable error descriptions, exit codes and structured JSON error formatting.

use std::fmt;
use std::path::PathBuf;

use actuator_core::error::{ActuatorError, BuildError, ConfigurationError, InvariantViolation};

/// Exit code for configuration problems (bad file, bad values, rejected encoder).
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for requests that would leave the actuator with an undefined command.
pub const EXIT_INVARIANT: i32 = 3;
/// Exit code for everything else (hardware, I/O, interruption).
pub const EXIT_OTHER: i32 = 1;

/// Context attached to errors raised while reading a user-supplied file.
/// Anything wrapped in it classifies as a configuration error.
#[derive(Debug, Clone)]
pub struct InputFile(pub PathBuf);

impl fmt::Display for InputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loading {}", self.0.display())
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(ce) = err.downcast_ref::<ConfigurationError>() {
        return match ce {
            ConfigurationError::LinearUnconfigured => {
                "What happened: A linear (meters) operation was requested but no radius is configured.\nLikely causes: [actuator].radius_m is missing while a simple feedforward or linear command is used.\nHow to fix: Set radius_m in the config, or use the arm feedforward for rotary mechanisms.".to_string()
            }
            ConfigurationError::InvalidEncoderConfig(msg) => format!(
                "What happened: The device rejected the encoder configuration ({msg}).\nLikely causes: counts_per_revolution does not match the encoder kind (hall_effect sensors report 42 counts).\nHow to fix: Fix the [encoder] section and rerun self-check."
            ),
            ConfigurationError::InvalidConfiguration(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values or conflicting options.\nHow to fix: Adjust the config or command-line options, then rerun."
            ),
        };
    }

    if let Some(iv) = err.downcast_ref::<InvariantViolation>() {
        return match iv {
            InvariantViolation::EncoderNotConfigured => {
                "What happened: Closed-loop operation needs a configured encoder.\nLikely causes: [encoder].kind is \"none\" or the encoder section is missing.\nHow to fix: Configure the encoder (kind and counts_per_revolution) before moving the actuator.".to_string()
            }
            InvariantViolation::IncompatibleFeedforward => {
                "What happened: Arm feedforward cannot drive a linear actuator.\nLikely causes: [feedforward].kind = \"arm\" together with [actuator].radius_m.\nHow to fix: Remove radius_m or switch to the simple feedforward.".to_string()
            }
            InvariantViolation::NoControlLaw => {
                "What happened: No control law is installed.\nLikely causes: The controller was built without a correction or feedforward law.\nHow to fix: Install a control law before following a profile.".to_string()
            }
        };
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: {be}.\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
        );
    }

    if let Some(ae) = err.downcast_ref::<ActuatorError>() {
        if matches!(ae, ActuatorError::Timeout) {
            return "What happened: The actuator did not answer in time.\nLikely causes: Bus wiring, power, or an overloaded controller.\nHow to fix: Check the bus and power, then rerun with --log-level=debug.".to_string();
        }
        return format!(
            "What happened: {ae}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
        );
    }

    if let Some(te) = err.downcast_ref::<toml::de::Error>() {
        return format!(
            "What happened: The config file is not valid TOML for this tool.\nDetails: {te}\nHow to fix: Compare with etc/actuator.toml."
        );
    }

    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    // Profile CSV header special-case
    if lower.contains("profile csv must have headers") {
        return "Invalid headers in profile CSV. Expected 't_s,position'.".to_string();
    }

    if let Some(file) = err.downcast_ref::<InputFile>() {
        return format!(
            "What happened: Could not use {}.\nDetails: {msg}\nHow to fix: Check the path and the file contents.",
            file.0.display()
        );
    }

    format!(
        "Something went wrong.\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 configuration, 3 invariant violation, 1 other.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<InvariantViolation>().is_some() {
        return EXIT_INVARIANT;
    }
    if err.downcast_ref::<ConfigurationError>().is_some()
        || err.downcast_ref::<BuildError>().is_some()
        || err.downcast_ref::<InputFile>().is_some()
    {
        return EXIT_CONFIG;
    }
    EXIT_OTHER
}

/// Stable name of the error class, used as `reason` in JSON output.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(iv) = err.downcast_ref::<InvariantViolation>() {
        return match iv {
            InvariantViolation::EncoderNotConfigured => "EncoderNotConfigured",
            InvariantViolation::IncompatibleFeedforward => "IncompatibleFeedforward",
            InvariantViolation::NoControlLaw => "NoControlLaw",
        };
    }
    if let Some(ce) = err.downcast_ref::<ConfigurationError>() {
        return match ce {
            ConfigurationError::LinearUnconfigured => "LinearUnconfigured",
            ConfigurationError::InvalidEncoderConfig(_) => "InvalidEncoderConfig",
            ConfigurationError::InvalidConfiguration(_) => "InvalidConfiguration",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() || err.downcast_ref::<InputFile>().is_some() {
        return "InvalidConfiguration";
    }
    match err.downcast_ref::<ActuatorError>() {
        Some(ActuatorError::Timeout) => "Timeout",
        Some(_) => "Hardware",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
