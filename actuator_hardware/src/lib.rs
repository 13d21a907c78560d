//! Hardware backends for `actuator_traits::ActuatorHardware`.
//!
//! `SimulatedActuator` models a brushed DC motor with an attached encoder so the
//! control core can be exercised end to end without a device on the bus.
pub mod error;

use std::f64::consts::TAU;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use actuator_traits::clock::{Clock, MonotonicClock};
use actuator_traits::{ActuatorHardware, EncoderConfig, EncoderKind, HwResult};
use tracing::{debug, trace};

use crate::error::HwError;

/// Fixed resolution of the integrated hall sensor on brushless motor controllers.
pub const HALL_COUNTS_PER_REV: u32 = 42;
/// Highest quadrature resolution the simulated device accepts.
pub const MAX_QUADRATURE_CPR: u32 = 65_536;

/// Electrical/mechanical parameters of the simulated motor.
#[derive(Debug, Clone, Copy)]
pub struct MotorModel {
    /// Free speed per volt at the motor shaft (rad/s per V).
    pub free_speed_per_volt: f64,
    /// Mechanical time constant (s).
    pub time_constant_s: f64,
    /// Supply voltage; commands are clamped to ±bus_voltage.
    pub bus_voltage: f64,
    /// The encoder is mounted backwards: forward rotation counts down.
    /// Programming the encoder with `reversed` compensates for it.
    pub sensor_inverted: bool,
}

impl Default for MotorModel {
    fn default() -> Self {
        // Roughly a 5700 rpm brushless motor on a 12 V bus
        Self {
            free_speed_per_volt: 50.0,
            time_constant_s: 0.05,
            bus_voltage: 12.0,
            sensor_inverted: false,
        }
    }
}

/// Plant state shared between the simulated device and any probes.
#[derive(Debug, Clone, Default)]
pub struct PlantState {
    /// Motor shaft angle (rad).
    pub angle: f64,
    /// Motor shaft angular velocity (rad/s).
    pub omega: f64,
    pub applied_volts: f64,
    pub current_limit_a: Option<u32>,
    pub encoder: EncoderConfig,
    pub gains: (f64, f64, f64),
    pub conversion: (f64, f64),
    pub voltage_writes: u64,
}

/// Read-only view into a `SimulatedActuator` that stays valid after the device
/// has been moved into a controller.
#[derive(Debug, Clone)]
pub struct SimProbe {
    state: Arc<Mutex<PlantState>>,
}

impl SimProbe {
    pub fn snapshot(&self) -> PlantState {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

/// Simulated DC motor + encoder.
pub struct SimulatedActuator<C: Clock = MonotonicClock> {
    model: MotorModel,
    state: Arc<Mutex<PlantState>>,
    clock: C,
    last_step: Instant,
}

impl SimulatedActuator<MonotonicClock> {
    pub fn new(model: MotorModel) -> Self {
        Self::with_clock(model, MonotonicClock::new())
    }
}

impl Default for SimulatedActuator<MonotonicClock> {
    fn default() -> Self {
        Self::new(MotorModel::default())
    }
}

impl<C: Clock> SimulatedActuator<C> {
    pub fn with_clock(model: MotorModel, clock: C) -> Self {
        let last_step = clock.now();
        Self {
            model,
            state: Arc::new(Mutex::new(PlantState::default())),
            clock,
            last_step,
        }
    }

    pub fn probe(&self) -> SimProbe {
        SimProbe {
            state: Arc::clone(&self.state),
        }
    }

    /// Integrate the first-order motor model up to the clock's current time.
    fn advance(&mut self) -> Result<(), HwError> {
        let now = self.clock.now();
        let dt = now.saturating_duration_since(self.last_step).as_secs_f64();
        self.last_step = now;
        if dt <= 0.0 {
            return Ok(());
        }
        let mut s = self
            .state
            .lock()
            .map_err(|_| HwError::Bus("plant state poisoned".into()))?;
        let target = self.model.free_speed_per_volt * s.applied_volts;
        let tau = self.model.time_constant_s.max(1e-6);
        // Exact step response of a first-order lag over dt
        let decay = (-dt / tau).exp();
        let omega_next = target + (s.omega - target) * decay;
        s.angle += 0.5 * (s.omega + omega_next) * dt;
        s.omega = omega_next;
        Ok(())
    }

    /// Counts per motor radian as reported. `reversed` inverts the reading only;
    /// it never changes which way a positive voltage turns the motor.
    fn counts_scale(&self, enc: &EncoderConfig) -> Result<f64, HwError> {
        if !enc.is_configured() {
            return Err(HwError::Bus("encoder not programmed".into()));
        }
        let sign = if enc.reversed == self.model.sensor_inverted {
            1.0
        } else {
            -1.0
        };
        Ok(sign * f64::from(enc.counts_per_revolution) / TAU)
    }
}

impl<C: Clock> ActuatorHardware for SimulatedActuator<C> {
    fn read_raw_position(&mut self) -> HwResult<f64> {
        self.advance()?;
        let s = self
            .state
            .lock()
            .map_err(|_| HwError::Bus("plant state poisoned".into()))?;
        let counts = s.angle * self.counts_scale(&s.encoder)?;
        trace!(counts, "sim position read");
        Ok(counts)
    }

    fn read_raw_velocity(&mut self) -> HwResult<f64> {
        self.advance()?;
        let s = self
            .state
            .lock()
            .map_err(|_| HwError::Bus("plant state poisoned".into()))?;
        Ok(s.omega * self.counts_scale(&s.encoder)?)
    }

    fn write_voltage(&mut self, volts: f64) -> HwResult<()> {
        self.advance()?;
        let bus = self.model.bus_voltage;
        let mut s = self
            .state
            .lock()
            .map_err(|_| HwError::Bus("plant state poisoned".into()))?;
        s.applied_volts = if volts.is_finite() {
            volts.clamp(-bus, bus)
        } else {
            0.0
        };
        s.voltage_writes = s.voltage_writes.saturating_add(1);
        Ok(())
    }

    fn write_current_limit(&mut self, amps: u32) -> HwResult<()> {
        if amps == 0 {
            return Err(Box::new(HwError::Rejected("current limit must be > 0".into())));
        }
        if let Ok(mut s) = self.state.lock() {
            s.current_limit_a = Some(amps);
        }
        Ok(())
    }

    fn program_encoder(&mut self, cfg: &EncoderConfig) -> bool {
        let accepted = match cfg.kind {
            EncoderKind::None => true,
            EncoderKind::HallEffect => cfg.counts_per_revolution == HALL_COUNTS_PER_REV,
            EncoderKind::Quadrature => {
                (1..=MAX_QUADRATURE_CPR).contains(&cfg.counts_per_revolution)
            }
        };
        if accepted && let Ok(mut s) = self.state.lock() {
            s.encoder = *cfg;
        }
        debug!(?cfg, accepted, "sim encoder programming");
        accepted
    }

    fn program_gains(&mut self, p: f64, i: f64, d: f64) -> HwResult<()> {
        if !(p.is_finite() && i.is_finite() && d.is_finite()) {
            return Err(Box::new(HwError::Rejected("non-finite gain".into())));
        }
        if let Ok(mut s) = self.state.lock() {
            s.gains = (p, i, d);
        }
        Ok(())
    }

    fn program_conversion_multipliers(&mut self, velocity: f64, position: f64) -> HwResult<()> {
        if let Ok(mut s) = self.state.lock() {
            s.conversion = (velocity, position);
        }
        Ok(())
    }
}
