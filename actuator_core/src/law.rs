//! Control laws: functions from a controller snapshot to a voltage command.
//!
//! A law is replaced, never chained. The only wrapping is the motion-profile
//! run, which is modelled as its own `LawSlot` variant so a profile can only
//! ever capture a plain law.

use std::fmt;

use crate::config::Gains;
use crate::feedforward::{LinearFeedforward, RotationalFeedforward};
use crate::mode::ControlMode;
use crate::pid::Pid;
use crate::profile::ProfileRun;

/// Read-only view of the controller handed to a law each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlState {
    pub mode: ControlMode,
    /// Output-shaft angle (rad).
    pub position: f64,
    /// Output-shaft angular velocity (rad/s).
    pub velocity: f64,
    /// Output-shaft angular acceleration (rad/s^2), differentiated from velocity reads.
    pub acceleration: f64,
    /// Linear counterparts; `None` when no radius is configured.
    pub linear_velocity: Option<f64>,
    pub linear_acceleration: Option<f64>,
    pub position_setpoint: f64,
    pub velocity_setpoint: f64,
    /// Voltage requested through `set_voltage`.
    pub commanded_voltage: f64,
    pub gains: Gains,
    pub max_output_voltage: f64,
    /// Seconds since the previous tick.
    pub dt: f64,
}

impl ControlState {
    pub fn position_error(&self) -> f64 {
        self.position_setpoint - self.position
    }

    pub fn velocity_error(&self) -> f64 {
        self.velocity_setpoint - self.velocity
    }
}

/// A replaceable control law.
pub trait ControlLaw: Send {
    fn evaluate(&mut self, state: &ControlState) -> f64;
}

impl<F> ControlLaw for F
where
    F: FnMut(&ControlState) -> f64 + Send,
{
    fn evaluate(&mut self, state: &ControlState) -> f64 {
        self(state)
    }
}

/// Identity of an installed law, unique per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LawId(pub u64);

impl fmt::Display for LawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "law#{}", self.0)
    }
}

/// What produced an installed law.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LawKind {
    /// Correction keyed to the active mode.
    Correction,
    /// Linear feedforward + correction.
    LinearFeedforward,
    /// Rotational (arm) feedforward + correction.
    ArmFeedforward,
    /// Caller-supplied law.
    Custom,
}

pub struct InstalledLaw {
    pub(crate) id: LawId,
    pub(crate) kind: LawKind,
    pub(crate) law: Box<dyn ControlLaw>,
}

impl InstalledLaw {
    pub fn id(&self) -> LawId {
        self.id
    }

    pub fn kind(&self) -> LawKind {
        self.kind
    }

    pub(crate) fn evaluate(&mut self, state: &ControlState) -> f64 {
        self.law.evaluate(state)
    }

    pub(crate) fn into_slot(self) -> LawSlot {
        match self.kind {
            LawKind::Custom => LawSlot::Custom(self),
            _ => LawSlot::Builtin(self),
        }
    }
}

impl fmt::Debug for InstalledLaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstalledLaw")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// The controller's law slot.
#[derive(Debug, Default)]
pub enum LawSlot {
    #[default]
    Idle,
    Builtin(InstalledLaw),
    Custom(InstalledLaw),
    /// A motion profile driving the setpoint of the captured law.
    Profile(ProfileRun),
}

impl LawSlot {
    pub fn is_installed(&self) -> bool {
        !matches!(self, LawSlot::Idle)
    }

    /// The law whose output becomes the voltage command.
    pub fn active(&self) -> Option<&InstalledLaw> {
        match self {
            LawSlot::Idle => None,
            LawSlot::Builtin(l) | LawSlot::Custom(l) => Some(l),
            LawSlot::Profile(run) => Some(&run.prior),
        }
    }

    pub(crate) fn active_mut(&mut self) -> Option<&mut InstalledLaw> {
        match self {
            LawSlot::Idle => None,
            LawSlot::Builtin(l) | LawSlot::Custom(l) => Some(l),
            LawSlot::Profile(run) => Some(&mut run.prior),
        }
    }

    /// Identity of the law a profile would restore, or of the installed law.
    pub fn id(&self) -> Option<LawId> {
        self.active().map(InstalledLaw::id)
    }

    /// Remove the slot's plain law, unwrapping an in-flight profile.
    pub(crate) fn take_plain(&mut self) -> Option<InstalledLaw> {
        match std::mem::take(self) {
            LawSlot::Idle => None,
            LawSlot::Builtin(l) | LawSlot::Custom(l) => Some(l),
            LawSlot::Profile(run) => Some(run.prior),
        }
    }
}

/// Correction on the active mode's error; voltage override passes through.
#[derive(Debug, Default)]
pub struct CorrectionLaw {
    pid: Pid,
    last_mode: ControlMode,
}

impl CorrectionLaw {
    pub fn new() -> Self {
        Self::default()
    }

    /// PID output on the error of the current mode. Resets the accumulator
    /// when the mode changes so position and velocity history never mix.
    pub(crate) fn correction(&mut self, state: &ControlState) -> f64 {
        if state.mode != self.last_mode {
            self.pid.reset();
            self.last_mode = state.mode;
        }
        let error = match state.mode {
            ControlMode::Position => state.position_error(),
            ControlMode::Velocity => state.velocity_error(),
            ControlMode::Idle | ControlMode::VoltageOverride => return 0.0,
        };
        self.pid
            .update(error, &state.gains, state.dt, state.max_output_voltage)
    }
}

impl ControlLaw for CorrectionLaw {
    fn evaluate(&mut self, state: &ControlState) -> f64 {
        match state.mode {
            ControlMode::VoltageOverride => state.commanded_voltage,
            ControlMode::Idle => 0.0,
            _ => self.correction(state),
        }
    }
}

/// `f(linear v, linear a) + correction`.
pub struct LinearFeedforwardLaw<F> {
    ff: F,
    correction: CorrectionLaw,
}

impl<F: LinearFeedforward> LinearFeedforwardLaw<F> {
    pub fn new(ff: F) -> Self {
        Self {
            ff,
            correction: CorrectionLaw::new(),
        }
    }
}

impl<F: LinearFeedforward> ControlLaw for LinearFeedforwardLaw<F> {
    fn evaluate(&mut self, state: &ControlState) -> f64 {
        match state.mode {
            ControlMode::VoltageOverride => state.commanded_voltage,
            ControlMode::Idle => 0.0,
            _ => {
                let v = state.linear_velocity.unwrap_or(0.0);
                let a = state.linear_acceleration.unwrap_or(0.0);
                self.ff.calculate(v, a) + self.correction.correction(state)
            }
        }
    }
}

/// `f(θ, ω, α) + correction`.
pub struct ArmFeedforwardLaw<F> {
    ff: F,
    correction: CorrectionLaw,
}

impl<F: RotationalFeedforward> ArmFeedforwardLaw<F> {
    pub fn new(ff: F) -> Self {
        Self {
            ff,
            correction: CorrectionLaw::new(),
        }
    }
}

impl<F: RotationalFeedforward> ControlLaw for ArmFeedforwardLaw<F> {
    fn evaluate(&mut self, state: &ControlState) -> f64 {
        match state.mode {
            ControlMode::VoltageOverride => state.commanded_voltage,
            ControlMode::Idle => 0.0,
            _ => {
                self.ff
                    .calculate(state.position, state.velocity, state.acceleration)
                    + self.correction.correction(state)
            }
        }
    }
}
