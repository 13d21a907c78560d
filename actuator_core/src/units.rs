//! Rotational <-> linear unit conversion and encoder count scaling.
//!
//! Angles are radians, lengths are metres, times are seconds. A radius is
//! "present" only when it is `Some`, finite and strictly positive.

use std::f64::consts::TAU;

use crate::error::ConfigurationError;

/// The radius if present, else `LinearUnconfigured`.
#[inline]
pub fn require_radius(radius: Option<f64>) -> Result<f64, ConfigurationError> {
    match radius {
        Some(r) if r.is_finite() && r > 0.0 => Ok(r),
        _ => Err(ConfigurationError::LinearUnconfigured),
    }
}

/// Arc length swept by `angle` at `radius`.
#[inline]
pub fn angle_to_length(angle: f64, radius: Option<f64>) -> Result<f64, ConfigurationError> {
    Ok(angle * require_radius(radius)?)
}

/// Angle that sweeps `length` at `radius`.
#[inline]
pub fn length_to_angle(length: f64, radius: Option<f64>) -> Result<f64, ConfigurationError> {
    Ok(length / require_radius(radius)?)
}

#[inline]
pub fn angular_to_linear_velocity(
    omega: f64,
    radius: Option<f64>,
) -> Result<f64, ConfigurationError> {
    Ok(omega * require_radius(radius)?)
}

#[inline]
pub fn linear_to_angular_velocity(
    velocity: f64,
    radius: Option<f64>,
) -> Result<f64, ConfigurationError> {
    Ok(velocity / require_radius(radius)?)
}

/// Output-shaft radians represented by one encoder count.
///
/// `counts / cpr` gives motor revolutions; dividing by the gear ratio gives
/// output revolutions. Returns `None` for a zero resolution.
#[inline]
pub fn radians_per_count(counts_per_revolution: u32, gear_ratio: f64) -> Option<f64> {
    if counts_per_revolution == 0 || !(gear_ratio.is_finite() && gear_ratio > 0.0) {
        return None;
    }
    Some(TAU / (f64::from(counts_per_revolution) * gear_ratio))
}
