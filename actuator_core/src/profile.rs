//! Motion profiles and the temporary profile run that drives a law's setpoint.

use std::fmt;
use std::time::{Duration, Instant};

use crate::config::Constraints;
use crate::error::ConfigurationError;
use crate::law::InstalledLaw;

/// Target sample of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProfileState {
    pub position: f64,
    pub velocity: f64,
}

/// Time-parameterized target trajectory in output-shaft units.
pub trait MotionProfile: Send {
    /// Target at `elapsed` since the profile started. Times past the end hold
    /// the final state.
    fn sample(&self, elapsed: Duration) -> ProfileState;
    /// Time to reach the final state.
    fn total_time(&self) -> Duration;
}

/// Trapezoidal velocity profile between two rest states.
///
/// Accelerates at `max_acceleration` up to `max_velocity`, cruises, then
/// decelerates symmetrically. When the distance is too short to reach
/// `max_velocity` the cruise phase vanishes and the profile is triangular.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrapezoidProfile {
    start: f64,
    direction: f64,
    distance: f64,
    accel: f64,
    peak_velocity: f64,
    accel_time: f64,
    cruise_time: f64,
}

impl TrapezoidProfile {
    pub fn new(
        constraints: Constraints,
        start: f64,
        goal: f64,
    ) -> Result<Self, ConfigurationError> {
        constraints.validate()?;
        if !(start.is_finite() && goal.is_finite()) {
            return Err(ConfigurationError::InvalidConfiguration(
                "profile endpoints must be finite",
            ));
        }
        let distance = (goal - start).abs();
        let direction = if goal >= start { 1.0 } else { -1.0 };
        let accel = constraints.max_acceleration;
        let mut accel_time = constraints.max_velocity / accel;
        let accel_distance = 0.5 * accel * accel_time * accel_time;
        let (peak_velocity, cruise_time) = if 2.0 * accel_distance > distance {
            accel_time = (distance / accel).sqrt();
            (accel * accel_time, 0.0)
        } else {
            (
                constraints.max_velocity,
                (distance - 2.0 * accel_distance) / constraints.max_velocity,
            )
        };
        Ok(Self {
            start,
            direction,
            distance,
            accel,
            peak_velocity,
            accel_time,
            cruise_time,
        })
    }

    pub fn goal(&self) -> f64 {
        self.start + self.direction * self.distance
    }

    fn total_secs(&self) -> f64 {
        2.0 * self.accel_time + self.cruise_time
    }
}

impl MotionProfile for TrapezoidProfile {
    fn sample(&self, elapsed: Duration) -> ProfileState {
        let total = self.total_secs();
        let t = elapsed.as_secs_f64().clamp(0.0, total);
        let accel_distance = 0.5 * self.accel * self.accel_time * self.accel_time;
        let (p, v) = if t < self.accel_time {
            (0.5 * self.accel * t * t, self.accel * t)
        } else if t < self.accel_time + self.cruise_time {
            (
                accel_distance + self.peak_velocity * (t - self.accel_time),
                self.peak_velocity,
            )
        } else {
            let remaining = total - t;
            (
                self.distance - 0.5 * self.accel * remaining * remaining,
                self.accel * remaining,
            )
        };
        ProfileState {
            position: self.start + self.direction * p,
            velocity: self.direction * v,
        }
    }

    fn total_time(&self) -> Duration {
        Duration::from_secs_f64(self.total_secs())
    }
}

/// Piecewise-linear profile through `(time_s, position)` rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TabulatedProfile {
    rows: Vec<(f64, f64)>,
}

impl TabulatedProfile {
    /// Rows must be finite, at least two, with strictly increasing time.
    /// Times are taken relative to the first row.
    pub fn new(rows: Vec<(f64, f64)>) -> Result<Self, ConfigurationError> {
        if rows.len() < 2 {
            return Err(ConfigurationError::InvalidConfiguration(
                "tabulated profile needs at least two rows",
            ));
        }
        if rows.iter().any(|(t, p)| !(t.is_finite() && p.is_finite())) {
            return Err(ConfigurationError::InvalidConfiguration(
                "tabulated profile rows must be finite",
            ));
        }
        if rows.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err(ConfigurationError::InvalidConfiguration(
                "tabulated profile times must be strictly increasing",
            ));
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[(f64, f64)] {
        &self.rows
    }
}

impl MotionProfile for TabulatedProfile {
    fn sample(&self, elapsed: Duration) -> ProfileState {
        let (t0, p0) = self.rows[0];
        let t = t0 + elapsed.as_secs_f64();
        if t <= t0 {
            return ProfileState {
                position: p0,
                velocity: 0.0,
            };
        }
        for w in self.rows.windows(2) {
            let (ta, pa) = w[0];
            let (tb, pb) = w[1];
            if t <= tb {
                let slope = (pb - pa) / (tb - ta);
                return ProfileState {
                    position: pa + slope * (t - ta),
                    velocity: slope,
                };
            }
        }
        let (_, last) = self.rows[self.rows.len() - 1];
        ProfileState {
            position: last,
            velocity: 0.0,
        }
    }

    fn total_time(&self) -> Duration {
        let first = self.rows[0].0;
        let last = self.rows[self.rows.len() - 1].0;
        Duration::from_secs_f64((last - first).max(0.0))
    }
}

/// An in-flight profile: the law it captured plus its timing.
pub struct ProfileRun {
    pub(crate) prior: InstalledLaw,
    pub(crate) profile: Box<dyn MotionProfile>,
    pub(crate) started: Instant,
    pub(crate) duration: Duration,
}

impl ProfileRun {
    pub fn prior(&self) -> &InstalledLaw {
        &self.prior
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Debug for ProfileRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileRun")
            .field("prior", &self.prior)
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn trapezoid_reaches_goal_and_rests() {
        let p = TrapezoidProfile::new(Constraints::new(2.0, 4.0), 0.0, 3.0).unwrap();
        // accel 0.5 s (0.5 rad), cruise 1.0 s, decel 0.5 s
        assert!((p.total_time().as_secs_f64() - 2.0).abs() < 1e-9);
        let mid = p.sample(ms(1000));
        assert!((mid.velocity - 2.0).abs() < 1e-9);
        assert!((mid.position - 1.5).abs() < 1e-9);
        let end = p.sample(ms(5000));
        assert!((end.position - 3.0).abs() < 1e-9);
        assert_eq!(end.velocity, 0.0);
    }

    #[test]
    fn short_move_is_triangular() {
        let p = TrapezoidProfile::new(Constraints::new(10.0, 1.0), 0.0, 1.0).unwrap();
        // peak at t = 1 s with v = 1 rad/s
        assert!((p.total_time().as_secs_f64() - 2.0).abs() < 1e-9);
        let peak = p.sample(ms(1000));
        assert!((peak.velocity - 1.0).abs() < 1e-9);
        assert!((peak.position - 0.5).abs() < 1e-9);
    }

    #[test]
    fn reverse_direction() {
        let p = TrapezoidProfile::new(Constraints::new(1.0, 1.0), 2.0, -2.0).unwrap();
        let s = p.sample(ms(500));
        assert!(s.velocity < 0.0);
        assert!(s.position < 2.0);
        assert!((p.sample(p.total_time()).position + 2.0).abs() < 1e-9);
    }

    #[test]
    fn zero_distance_is_instant() {
        let p = TrapezoidProfile::new(Constraints::new(1.0, 1.0), 1.0, 1.0).unwrap();
        assert_eq!(p.total_time(), Duration::ZERO);
        assert_eq!(p.sample(ms(10)).position, 1.0);
    }

    #[test]
    fn tabulated_interpolates_and_holds() {
        let p = TabulatedProfile::new(vec![(1.0, 0.0), (2.0, 1.0), (3.0, 1.0)]).unwrap();
        assert_eq!(p.total_time(), Duration::from_secs(2));
        let s = p.sample(ms(500));
        assert!((s.position - 0.5).abs() < 1e-12);
        assert!((s.velocity - 1.0).abs() < 1e-12);
        assert_eq!(p.sample(ms(9000)).position, 1.0);
    }

    #[test]
    fn tabulated_rejects_unsorted_rows() {
        assert!(TabulatedProfile::new(vec![(0.0, 0.0), (0.0, 1.0)]).is_err());
        assert!(TabulatedProfile::new(vec![(0.0, 0.0)]).is_err());
    }
}
