//! PID correction term.
//!
//! Gains are passed in on every update so a gain change on the controller
//! takes effect on the next tick without rebuilding the law.

use crate::config::Gains;

/// Stateful PID accumulator.
///
/// - Integral is clamped to `±output_limit / ki` when `ki > 0` (anti-windup).
/// - Derivative is on error; the first sample after a reset contributes 0.
#[derive(Debug, Clone, Default)]
pub struct Pid {
    integral: f64,
    last_error: Option<f64>,
}

impl Pid {
    pub const fn new() -> Self {
        Self {
            integral: 0.0,
            last_error: None,
        }
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = None;
    }

    /// Correction in volts for `error` over a step of `dt` seconds.
    pub fn update(&mut self, error: f64, gains: &Gains, dt: f64, output_limit: f64) -> f64 {
        if !error.is_finite() {
            return 0.0;
        }
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        if gains.ki != 0.0 && dt > 0.0 {
            self.integral += error * dt;
            if gains.ki > 0.0 && output_limit > 0.0 {
                let bound = output_limit / gains.ki;
                self.integral = self.integral.clamp(-bound, bound);
            }
        }

        let derivative = match self.last_error {
            Some(prev) if dt > 0.0 => (error - prev) / dt,
            _ => 0.0,
        };
        self.last_error = Some(error);

        gains.kp * error + gains.ki * self.integral + gains.kd * derivative
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proportional_only() {
        let mut pid = Pid::new();
        let g = Gains::new(2.0, 0.0, 0.0);
        assert_eq!(pid.update(1.5, &g, 0.02, 12.0), 3.0);
    }

    #[test]
    fn first_sample_has_no_derivative_kick() {
        let mut pid = Pid::new();
        let g = Gains::new(0.0, 0.0, 1.0);
        assert_eq!(pid.update(10.0, &g, 0.02, 12.0), 0.0);
        let d = pid.update(10.2, &g, 0.02, 12.0);
        assert!((d - 10.0).abs() < 1e-9);
    }

    #[test]
    fn integral_is_clamped() {
        let mut pid = Pid::new();
        let g = Gains::new(0.0, 1.0, 0.0);
        for _ in 0..10_000 {
            pid.update(100.0, &g, 0.02, 12.0);
        }
        let out = pid.update(100.0, &g, 0.02, 12.0);
        assert!(out <= 12.0 + 1e-9);
    }

    #[test]
    fn reset_clears_history() {
        let mut pid = Pid::new();
        let g = Gains::new(0.0, 1.0, 0.0);
        pid.update(1.0, &g, 1.0, 12.0);
        pid.reset();
        assert_eq!(pid.update(0.0, &g, 1.0, 12.0), 0.0);
    }
}
