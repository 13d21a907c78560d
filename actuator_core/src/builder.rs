//! Builder for `ActuatorController`.
//!
//! A builder starts simulated (no hardware). `with_hardware` swaps in a
//! backend and changes the builder's hardware type, so a statically-dispatched
//! controller can be built from a concrete backend without boxing.

use std::sync::Arc;
use std::time::Duration;

use actuator_traits::clock::{Clock, MonotonicClock};
use actuator_traits::{ActuatorHardware, EncoderConfig, NullSink, TelemetrySink};

use crate::ActuatorId;
use crate::atomic::OutputCell;
use crate::config::{Constraints, DEFAULT_MAX_OUTPUT_VOLTAGE, Gains, LoopCfg};
use crate::controller::{ActuatorController, BoxedHardware};
use crate::conversions::encoder_from_config;
use crate::error::{BuildError, Result};
use crate::feedforward::{ArmFeedforward, SimpleMotorFeedforward};
use crate::follower::FollowerSet;
use crate::law::LawSlot;
use crate::mode::ControlMode;

/// Law installed once the controller is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InitialLaw {
    #[default]
    None,
    Correction,
    Simple(SimpleMotorFeedforward),
    Arm(ArmFeedforward),
}

pub struct ActuatorBuilder<H: ActuatorHardware = BoxedHardware> {
    id: ActuatorId,
    hardware: Option<H>,
    gear_ratio: f64,
    radius: Option<f64>,
    encoder: Option<EncoderConfig>,
    gains: Gains,
    constraints: Constraints,
    max_output_voltage: f64,
    current_limit: Option<u32>,
    loop_cfg: LoopCfg,
    law: InitialLaw,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    telemetry: Option<Box<dyn TelemetrySink>>,
}

impl ActuatorController<BoxedHardware> {
    /// Start building a controller with the given identity.
    pub fn builder(id: ActuatorId) -> ActuatorBuilder<BoxedHardware> {
        ActuatorBuilder::new(id)
    }
}

impl ActuatorBuilder<BoxedHardware> {
    pub fn new(id: ActuatorId) -> Self {
        Self {
            id,
            hardware: None,
            gear_ratio: 1.0,
            radius: None,
            encoder: None,
            gains: Gains::default(),
            constraints: Constraints::default(),
            max_output_voltage: DEFAULT_MAX_OUTPUT_VOLTAGE,
            current_limit: None,
            loop_cfg: LoopCfg::default(),
            law: InitialLaw::None,
            clock: None,
            telemetry: None,
        }
    }
}

impl<H: ActuatorHardware> ActuatorBuilder<H> {
    /// Attach a hardware backend; the built controller is physical.
    pub fn with_hardware<H2: ActuatorHardware>(self, hardware: H2) -> ActuatorBuilder<H2> {
        ActuatorBuilder {
            id: self.id,
            hardware: Some(hardware),
            gear_ratio: self.gear_ratio,
            radius: self.radius,
            encoder: self.encoder,
            gains: self.gains,
            constraints: self.constraints,
            max_output_voltage: self.max_output_voltage,
            current_limit: self.current_limit,
            loop_cfg: self.loop_cfg,
            law: self.law,
            clock: self.clock,
            telemetry: self.telemetry,
        }
    }

    pub fn with_gear_ratio(mut self, gear_ratio: f64) -> Self {
        self.gear_ratio = gear_ratio;
        self
    }
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }
    pub fn with_encoder(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = Some(encoder);
        self
    }
    pub fn with_gains(mut self, gains: Gains) -> Self {
        self.gains = gains;
        self
    }
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }
    pub fn with_max_output_voltage(mut self, volts: f64) -> Self {
        self.max_output_voltage = volts;
        self
    }
    pub fn with_current_limit(mut self, amps: u32) -> Self {
        self.current_limit = Some(amps);
        self
    }
    pub fn with_loop(mut self, loop_cfg: LoopCfg) -> Self {
        self.loop_cfg = loop_cfg;
        self
    }
    pub fn with_follower_sync(mut self, period: Duration) -> Self {
        self.loop_cfg.follower_sync = period;
        self
    }
    /// Install the built-in correction law on build.
    pub fn with_default_law(mut self) -> Self {
        self.law = InitialLaw::Correction;
        self
    }
    pub fn with_initial_law(mut self, law: InitialLaw) -> Self {
        self.law = law;
        self
    }
    /// Provide a custom clock; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }
    pub fn with_telemetry(mut self, sink: impl TelemetrySink + 'static) -> Self {
        self.telemetry = Some(Box::new(sink));
        self
    }

    /// Apply the leader section of a validated config: actuator, encoder,
    /// gains, constraints, loop timing and feedforward.
    pub fn with_config(mut self, cfg: &actuator_config::Config) -> Self {
        self.gear_ratio = cfg.actuator.gear_ratio;
        self.radius = cfg.actuator.radius_m;
        self.max_output_voltage = cfg.actuator.max_output_voltage;
        self.current_limit = cfg.actuator.current_limit_a;
        self.encoder = Some(encoder_from_config(&cfg.encoder));
        self.gains = (&cfg.gains).into();
        self.constraints = (&cfg.constraints).into();
        self.loop_cfg = (&cfg.loop_).into();
        self.law = match &cfg.feedforward {
            None => InitialLaw::Correction,
            Some(ff) => match ff.kind {
                actuator_config::FeedforwardKind::Simple => InitialLaw::Simple(ff.into()),
                actuator_config::FeedforwardKind::Arm => InitialLaw::Arm(ff.into()),
            },
        };
        self
    }

    /// Validate and construct. Physical backends are programmed with gains,
    /// current limit and encoder before the controller is returned.
    pub fn build(self) -> Result<ActuatorController<H>> {
        validate(&self)?;

        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(c) => c,
            None => Arc::new(MonotonicClock::new()),
        };

        let mut controller = ActuatorController {
            id: self.id,
            hardware: self.hardware,
            gear_ratio: self.gear_ratio,
            radius: self.radius,
            encoder: EncoderConfig::default(),
            mode: ControlMode::Idle,
            position_setpoint: 0.0,
            velocity_setpoint: 0.0,
            commanded_voltage: 0.0,
            shadow_position: 0.0,
            shadow_velocity: 0.0,
            last_velocity: None,
            acceleration: 0.0,
            gains: Gains::default(),
            constraints: self.constraints,
            law: LawSlot::Idle,
            next_law_id: 0,
            current_limit: None,
            max_output_voltage: self.max_output_voltage,
            output: Arc::new(OutputCell::new()),
            followers: FollowerSet::new(self.loop_cfg.follower_sync),
            clock,
            telemetry: self.telemetry.unwrap_or_else(|| Box::new(NullSink)),
            last_tick: None,
            nominal_tick: self.loop_cfg.tick,
        };

        controller.set_gains(self.gains)?;
        if let Some(amps) = self.current_limit {
            controller.set_current_limit(amps)?;
        }
        if let Some(enc) = self.encoder {
            controller
                .configure_encoder(enc)
                .map_err(eyre::Report::new)?;
        }
        match self.law {
            InitialLaw::None => {}
            InitialLaw::Correction => {
                controller.use_default_law();
            }
            InitialLaw::Simple(ff) => {
                controller.with_simple_feedforward(ff)?;
            }
            InitialLaw::Arm(ff) => {
                controller.with_arm_feedforward(ff)?;
            }
        }
        tracing::debug!(
            actuator = %controller.id(),
            physical = controller.is_physical(),
            gear_ratio = controller.gear_ratio(),
            "controller built"
        );
        Ok(controller)
    }
}

fn validate<H: ActuatorHardware>(b: &ActuatorBuilder<H>) -> Result<()> {
    if !(b.gear_ratio.is_finite() && b.gear_ratio > 0.0) {
        return Err(eyre::Report::new(BuildError::InvalidGearRatio));
    }
    if let Some(r) = b.radius
        && !(r.is_finite() && r > 0.0)
    {
        return Err(eyre::Report::new(BuildError::InvalidRadius));
    }
    if !(b.max_output_voltage.is_finite() && b.max_output_voltage > 0.0) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "max_output_voltage must be positive and finite",
        )));
    }
    if b.gains.validate().is_err() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "gains must be finite",
        )));
    }
    if b.constraints.validate().is_err() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "constraints must be positive and finite",
        )));
    }
    if b.loop_cfg.tick.is_zero() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "tick must be > 0",
        )));
    }
    if b.loop_cfg.follower_sync.is_zero() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "follower sync period must be > 0",
        )));
    }
    Ok(())
}
