//! Feedforward models.
//!
//! Two shapes are accepted by the controller:
//! - `LinearFeedforward`: volts from linear velocity and acceleration
//! - `RotationalFeedforward`: volts from angle, angular velocity and angular acceleration
//!
//! Any closure of the matching arity implements the trait, so callers can pass
//! their own model without a wrapper type.

/// `f(v, a) -> volts` over linear units (m/s, m/s^2).
pub trait LinearFeedforward: Send {
    fn calculate(&self, velocity: f64, acceleration: f64) -> f64;
}

impl<F> LinearFeedforward for F
where
    F: Fn(f64, f64) -> f64 + Send,
{
    fn calculate(&self, velocity: f64, acceleration: f64) -> f64 {
        self(velocity, acceleration)
    }
}

/// `f(θ, ω, α) -> volts` over rotational units (rad, rad/s, rad/s^2).
pub trait RotationalFeedforward: Send {
    fn calculate(&self, angle: f64, velocity: f64, acceleration: f64) -> f64;
}

impl<F> RotationalFeedforward for F
where
    F: Fn(f64, f64, f64) -> f64 + Send,
{
    fn calculate(&self, angle: f64, velocity: f64, acceleration: f64) -> f64 {
        self(angle, velocity, acceleration)
    }
}

#[inline]
fn signum_or_zero(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Static friction + velocity + acceleration model: `ks·sgn(v) + kv·v + ka·a`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimpleMotorFeedforward {
    pub ks: f64,
    pub kv: f64,
    pub ka: f64,
}

impl SimpleMotorFeedforward {
    pub const fn new(ks: f64, kv: f64, ka: f64) -> Self {
        Self { ks, kv, ka }
    }
}

impl LinearFeedforward for SimpleMotorFeedforward {
    fn calculate(&self, velocity: f64, acceleration: f64) -> f64 {
        self.ks * signum_or_zero(velocity) + self.kv * velocity + self.ka * acceleration
    }
}

/// Pivoting arm: adds a gravity term `kg·cos(θ)`, with θ = 0 horizontal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArmFeedforward {
    pub ks: f64,
    pub kg: f64,
    pub kv: f64,
    pub ka: f64,
}

impl ArmFeedforward {
    pub const fn new(ks: f64, kg: f64, kv: f64, ka: f64) -> Self {
        Self { ks, kg, kv, ka }
    }
}

impl RotationalFeedforward for ArmFeedforward {
    fn calculate(&self, angle: f64, velocity: f64, acceleration: f64) -> f64 {
        self.ks * signum_or_zero(velocity)
            + self.kg * angle.cos()
            + self.kv * velocity
            + self.ka * acceleration
    }
}
