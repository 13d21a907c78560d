//! The actuator controller: mode state, setpoints, law evaluation and the
//! periodic update tick.
//!
//! A controller either owns a hardware handle (physical) or runs against
//! in-memory shadow values (simulated). Reads never change the control mode;
//! commands (`set_position`, `set_velocity`, `set_voltage`, `set_mode`) do.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actuator_traits::clock::{Clock, MonotonicClock};
use actuator_traits::{ActuatorHardware, EncoderConfig, EncoderKind, TelemetrySink};
use eyre::WrapErr;
use tracing::{debug, trace, warn};

use crate::ActuatorId;
use crate::atomic::OutputCell;
use crate::config::{Constraints, Gains};
use crate::error::{ConfigurationError, InvariantViolation, Report, Result};
use crate::feedforward::{LinearFeedforward, RotationalFeedforward, SimpleMotorFeedforward};
use crate::follower::FollowerSet;
use crate::hw_error::map_boxed;
use crate::law::{
    ArmFeedforwardLaw, ControlLaw, ControlState, CorrectionLaw, InstalledLaw, LawId, LawKind,
    LawSlot, LinearFeedforwardLaw,
};
use crate::mode::ControlMode;
use crate::profile::{MotionProfile, ProfileRun};
use crate::units;

/// Hardware handle type used when the concrete backend is chosen at runtime.
pub type BoxedHardware = Box<dyn ActuatorHardware + Send>;

pub struct ActuatorController<H: ActuatorHardware = BoxedHardware> {
    pub(crate) id: ActuatorId,
    pub(crate) hardware: Option<H>,
    pub(crate) gear_ratio: f64,
    pub(crate) radius: Option<f64>,
    pub(crate) encoder: EncoderConfig,
    pub(crate) mode: ControlMode,
    pub(crate) position_setpoint: f64,
    pub(crate) velocity_setpoint: f64,
    pub(crate) commanded_voltage: f64,
    // Shadow values used when no hardware is attached
    pub(crate) shadow_position: f64,
    pub(crate) shadow_velocity: f64,
    // Velocity differentiator: last (time, rad/s) sample and derived rad/s^2
    pub(crate) last_velocity: Option<(Instant, f64)>,
    pub(crate) acceleration: f64,
    pub(crate) gains: Gains,
    pub(crate) constraints: Constraints,
    pub(crate) law: LawSlot,
    pub(crate) next_law_id: u64,
    pub(crate) current_limit: Option<u32>,
    pub(crate) max_output_voltage: f64,
    pub(crate) output: Arc<OutputCell>,
    pub(crate) followers: FollowerSet,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) telemetry: Box<dyn TelemetrySink>,
    pub(crate) last_tick: Option<Instant>,
    pub(crate) nominal_tick: Duration,
}

impl<H: ActuatorHardware> core::fmt::Debug for ActuatorController<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ActuatorController")
            .field("id", &self.id)
            .field("physical", &self.is_physical())
            .field("mode", &self.mode)
            .field("law", &self.law.id())
            .field("output_volts", &self.output.load())
            .finish()
    }
}

impl<H: ActuatorHardware> ActuatorController<H> {
    pub fn id(&self) -> ActuatorId {
        self.id
    }

    /// True when a hardware handle backs this controller.
    pub fn is_physical(&self) -> bool {
        self.hardware.is_some()
    }

    pub fn gear_ratio(&self) -> f64 {
        self.gear_ratio
    }

    pub fn radius(&self) -> Option<f64> {
        self.radius
    }

    /// Set or clear the radius that enables linear units.
    ///
    /// Refused when it would break the installed law: a linear feedforward
    /// needs a radius, an arm feedforward forbids one.
    pub fn set_radius(&mut self, radius: Option<f64>) -> Result<()> {
        if let Some(r) = radius
            && !(r.is_finite() && r > 0.0)
        {
            return Err(Report::new(ConfigurationError::InvalidConfiguration(
                "radius must be positive and finite",
            )));
        }
        match (radius, self.law.active().map(InstalledLaw::kind)) {
            (Some(_), Some(LawKind::ArmFeedforward)) => {
                return Err(Report::new(InvariantViolation::IncompatibleFeedforward));
            }
            (None, Some(LawKind::LinearFeedforward)) => {
                return Err(Report::new(ConfigurationError::LinearUnconfigured));
            }
            _ => {}
        }
        self.radius = radius;
        Ok(())
    }

    /// The last accepted encoder configuration.
    pub fn encoder_config(&self) -> EncoderConfig {
        self.encoder
    }

    /// Encoder configured and a control law installed.
    pub fn closed_loop_capable(&self) -> bool {
        self.encoder.is_configured() && self.law.is_installed()
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Select the active control domain explicitly.
    pub fn set_mode(&mut self, mode: ControlMode) {
        if self.mode != mode {
            debug!(actuator = %self.id, from = %self.mode, to = %mode, "mode change");
            self.mode = mode;
        }
    }

    /// Return to `Idle` and command 0 V.
    pub fn idle(&mut self) -> Result<()> {
        self.set_mode(ControlMode::Idle);
        self.commanded_voltage = 0.0;
        if self.output.is_following() {
            return Ok(());
        }
        self.write_output(0.0)
    }

    pub fn position_setpoint(&self) -> f64 {
        self.position_setpoint
    }

    pub fn velocity_setpoint(&self) -> f64 {
        self.velocity_setpoint
    }

    pub fn gains(&self) -> Gains {
        self.gains
    }

    /// Update correction gains; programs the device first when physical.
    pub fn set_gains(&mut self, gains: Gains) -> Result<()> {
        gains.validate().map_err(Report::new)?;
        if let Some(hw) = self.hardware.as_mut() {
            hw.program_gains(gains.kp, gains.ki, gains.kd)
                .map_err(map_boxed)
                .wrap_err("program_gains")?;
        }
        self.gains = gains;
        Ok(())
    }

    pub fn constraints(&self) -> Constraints {
        self.constraints
    }

    pub fn set_constraints(&mut self, constraints: Constraints) -> Result<()> {
        constraints.validate().map_err(Report::new)?;
        self.constraints = constraints;
        Ok(())
    }

    pub fn current_limit(&self) -> Option<u32> {
        self.current_limit
    }

    pub fn set_current_limit(&mut self, amps: u32) -> Result<()> {
        if let Some(hw) = self.hardware.as_mut() {
            hw.write_current_limit(amps)
                .map_err(map_boxed)
                .wrap_err("write_current_limit")?;
        }
        self.current_limit = Some(amps);
        Ok(())
    }

    pub fn max_output_voltage(&self) -> f64 {
        self.max_output_voltage
    }

    /// Most recently written voltage command (mirrored from the leader while following).
    pub fn output_voltage(&self) -> f64 {
        self.output.load()
    }

    /// Replace the telemetry sink.
    pub fn set_telemetry(&mut self, sink: impl TelemetrySink + 'static) {
        self.telemetry = Box::new(sink);
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    fn radians_per_count(&self) -> Result<f64> {
        if !self.encoder.is_configured() {
            return Err(Report::new(InvariantViolation::EncoderNotConfigured));
        }
        units::radians_per_count(self.encoder.counts_per_revolution, self.gear_ratio)
            .ok_or_else(|| Report::new(InvariantViolation::EncoderNotConfigured))
    }

    /// Output-shaft angle (rad). Physical reads scale encoder counts by the
    /// encoder resolution and gear ratio; simulated reads return the shadow value.
    pub fn position(&mut self) -> Result<f64> {
        if !self.is_physical() {
            return Ok(self.shadow_position);
        }
        let per_count = self.radians_per_count()?;
        let Some(hw) = self.hardware.as_mut() else {
            return Ok(self.shadow_position);
        };
        let counts = hw
            .read_raw_position()
            .map_err(map_boxed)
            .wrap_err("reading position")?;
        Ok(counts * per_count)
    }

    /// Output-shaft angular velocity (rad/s). Every read feeds the acceleration
    /// differentiator.
    pub fn velocity(&mut self) -> Result<f64> {
        let v = if self.is_physical() {
            let per_count = self.radians_per_count()?;
            let Some(hw) = self.hardware.as_mut() else {
                return Ok(self.shadow_velocity);
            };
            let counts_per_sec = hw
                .read_raw_velocity()
                .map_err(map_boxed)
                .wrap_err("reading velocity")?;
            counts_per_sec * per_count
        } else {
            self.shadow_velocity
        };
        self.observe_velocity(v);
        Ok(v)
    }

    /// Angular acceleration (rad/s^2) differentiated from successive velocity reads.
    pub fn acceleration(&mut self) -> Result<f64> {
        self.velocity()?;
        Ok(self.acceleration)
    }

    fn observe_velocity(&mut self, v: f64) {
        let now = self.clock.now();
        if let Some((t, prev)) = self.last_velocity {
            let dt = now.saturating_duration_since(t).as_secs_f64();
            // Same-instant reads keep the previous estimate
            if dt > 0.0 {
                self.acceleration = (v - prev) / dt;
            }
        }
        self.last_velocity = Some((now, v));
    }

    pub fn linear_position(&mut self) -> Result<f64> {
        units::require_radius(self.radius).map_err(Report::new)?;
        let angle = self.position()?;
        units::angle_to_length(angle, self.radius).map_err(Report::new)
    }

    pub fn linear_velocity(&mut self) -> Result<f64> {
        units::require_radius(self.radius).map_err(Report::new)?;
        let omega = self.velocity()?;
        units::angular_to_linear_velocity(omega, self.radius).map_err(Report::new)
    }

    pub fn linear_acceleration(&mut self) -> Result<f64> {
        units::require_radius(self.radius).map_err(Report::new)?;
        let alpha = self.acceleration()?;
        units::angular_to_linear_velocity(alpha, self.radius).map_err(Report::new)
    }

    // ── Commands ─────────────────────────────────────────────────────────────

    fn require_finite(value: f64) -> Result<()> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(Report::new(ConfigurationError::InvalidConfiguration(
                "command must be finite",
            )))
        }
    }

    /// Command an output-shaft angle and select `Position`.
    ///
    /// - simulated: stored straight into the shadow position
    /// - closed-loop capable: only the setpoint changes; the law drives hardware
    /// - physical without closed loop: written through as a raw voltage command
    pub fn set_position(&mut self, angle: f64) -> Result<()> {
        Self::require_finite(angle)?;
        self.set_mode(ControlMode::Position);
        self.position_setpoint = angle;
        if !self.is_physical() {
            self.shadow_position = angle;
            return Ok(());
        }
        if self.closed_loop_capable() {
            return Ok(());
        }
        self.write_raw_command(angle)
    }

    /// Command an output-shaft angular velocity and select `Velocity`.
    pub fn set_velocity(&mut self, omega: f64) -> Result<()> {
        Self::require_finite(omega)?;
        self.set_mode(ControlMode::Velocity);
        self.velocity_setpoint = omega;
        if !self.is_physical() {
            self.shadow_velocity = omega;
            return Ok(());
        }
        if self.closed_loop_capable() {
            return Ok(());
        }
        self.write_raw_command(omega)
    }

    pub fn set_linear_position(&mut self, length: f64) -> Result<()> {
        let angle = units::length_to_angle(length, self.radius).map_err(Report::new)?;
        self.set_position(angle)
    }

    pub fn set_linear_velocity(&mut self, velocity: f64) -> Result<()> {
        let omega = units::linear_to_angular_velocity(velocity, self.radius).map_err(Report::new)?;
        self.set_velocity(omega)
    }

    /// Command a voltage directly and select `VoltageOverride`.
    pub fn set_voltage(&mut self, volts: f64) -> Result<()> {
        Self::require_finite(volts)?;
        self.set_mode(ControlMode::VoltageOverride);
        self.commanded_voltage = volts;
        if self.output.is_following() {
            debug!(actuator = %self.id, "voltage command ignored while following");
            return Ok(());
        }
        let v = self.clamp_output(volts);
        self.write_output(v)
    }

    fn write_raw_command(&mut self, value: f64) -> Result<()> {
        if self.output.is_following() {
            debug!(actuator = %self.id, "raw command ignored while following");
            return Ok(());
        }
        let volts = self.clamp_output(value);
        trace!(actuator = %self.id, volts, "raw command (no closed loop)");
        self.write_output(volts)
    }

    fn clamp_output(&self, volts: f64) -> f64 {
        if !volts.is_finite() {
            return 0.0;
        }
        volts.clamp(-self.max_output_voltage, self.max_output_voltage)
    }

    /// Write through the hardware handle (or just the shadow output), publish
    /// the value to the shared output cell and push it to every follower.
    /// Never retried on failure.
    fn write_output(&mut self, volts: f64) -> Result<()> {
        if let Some(hw) = self.hardware.as_mut()
            && let Err(e) = hw.write_voltage(volts)
        {
            warn!(actuator = %self.id, volts, error = %e, "voltage write failed");
            return Err(map_boxed(e)).wrap_err("write_voltage");
        }
        self.output.store(volts);
        self.followers.broadcast(volts);
        Ok(())
    }

    // ── Encoder ──────────────────────────────────────────────────────────────

    /// Program a new encoder configuration.
    ///
    /// On rejection the previous configuration is kept, the failure is logged
    /// and published as `encoder_rejected`, and the error is returned.
    pub fn configure_encoder(&mut self, cfg: EncoderConfig) -> Result<(), ConfigurationError> {
        let result = self.try_configure_encoder(cfg);
        match &result {
            Ok(()) => debug!(actuator = %self.id, ?cfg, "encoder configured"),
            Err(e) => {
                warn!(actuator = %self.id, ?cfg, error = %e, "encoder configuration rejected; keeping previous");
                self.telemetry.publish("encoder_rejected", 1.0);
            }
        }
        result
    }

    fn try_configure_encoder(&mut self, cfg: EncoderConfig) -> Result<(), ConfigurationError> {
        if cfg.kind != EncoderKind::None && cfg.counts_per_revolution == 0 {
            return Err(ConfigurationError::InvalidEncoderConfig(
                "counts_per_revolution must be > 0 when an encoder is fitted".into(),
            ));
        }
        if let Some(hw) = self.hardware.as_mut() {
            if !hw.program_encoder(&cfg) {
                return Err(ConfigurationError::InvalidEncoderConfig(format!(
                    "device refused {:?} at {} cpr",
                    cfg.kind, cfg.counts_per_revolution
                )));
            }
            if let Some(per_count) =
                units::radians_per_count(cfg.counts_per_revolution, self.gear_ratio)
                && let Err(e) = hw.program_conversion_multipliers(per_count, per_count)
            {
                warn!(actuator = %self.id, error = %e, "conversion multipliers not programmed");
            }
        }
        self.encoder = cfg;
        self.last_velocity = None;
        self.acceleration = 0.0;
        Ok(())
    }

    // ── Control laws ─────────────────────────────────────────────────────────

    fn install(&mut self, kind: LawKind, law: Box<dyn ControlLaw>) -> LawId {
        self.next_law_id += 1;
        let id = LawId(self.next_law_id);
        if matches!(self.law, LawSlot::Profile(_)) {
            debug!(actuator = %self.id, "law replaced; in-flight profile discarded");
        }
        self.law = InstalledLaw { id, kind, law }.into_slot();
        debug!(actuator = %self.id, %id, ?kind, "control law installed");
        id
    }

    /// Install a caller-supplied law, replacing the current one.
    pub fn set_control_law<L: ControlLaw + 'static>(&mut self, law: L) -> LawId {
        self.install(LawKind::Custom, Box::new(law))
    }

    /// Install the built-in correction law keyed to the active mode.
    pub fn use_default_law(&mut self) -> LawId {
        self.install(LawKind::Correction, Box::new(CorrectionLaw::new()))
    }

    /// Install `f(linear v, linear a) + correction`. Needs a radius.
    pub fn with_feedforward<F: LinearFeedforward + 'static>(&mut self, ff: F) -> Result<LawId> {
        units::require_radius(self.radius).map_err(Report::new)?;
        Ok(self.install(
            LawKind::LinearFeedforward,
            Box::new(LinearFeedforwardLaw::new(ff)),
        ))
    }

    pub fn with_simple_feedforward(&mut self, ff: SimpleMotorFeedforward) -> Result<LawId> {
        self.with_feedforward(ff)
    }

    /// Install `f(θ, ω, α) + correction`. Refused on a linear actuator.
    pub fn with_arm_feedforward<F: RotationalFeedforward + 'static>(
        &mut self,
        ff: F,
    ) -> Result<LawId> {
        if self.radius.is_some() {
            return Err(Report::new(InvariantViolation::IncompatibleFeedforward));
        }
        Ok(self.install(
            LawKind::ArmFeedforward,
            Box::new(ArmFeedforwardLaw::new(ff)),
        ))
    }

    /// Remove the installed law (and any profile run). Returns the removed id.
    pub fn clear_control_law(&mut self) -> Option<LawId> {
        self.law.take_plain().map(|l| l.id())
    }

    /// Identity of the law that computes the voltage command.
    pub fn law_id(&self) -> Option<LawId> {
        self.law.id()
    }

    pub fn law_kind(&self) -> Option<LawKind> {
        self.law.active().map(InstalledLaw::kind)
    }

    // ── Motion profiles ──────────────────────────────────────────────────────

    /// Drive the position setpoint from `profile` for `duration`, evaluating
    /// the currently installed law each tick, then restore that law.
    ///
    /// Starting a profile while one is in flight replaces the run; the new run
    /// captures the same underlying law.
    pub fn follow_profile<P: MotionProfile + 'static>(
        &mut self,
        profile: P,
        duration: Duration,
    ) -> Result<()> {
        if self.is_physical() && !self.encoder.is_configured() {
            return Err(Report::new(InvariantViolation::EncoderNotConfigured))
                .wrap_err("follow_profile");
        }
        if !self.closed_loop_capable() {
            let violation = if self.law.is_installed() {
                InvariantViolation::EncoderNotConfigured
            } else {
                InvariantViolation::NoControlLaw
            };
            return Err(Report::new(violation)).wrap_err("follow_profile");
        }
        if matches!(self.law, LawSlot::Profile(_)) {
            debug!(actuator = %self.id, "profile restarted; previous run discarded");
        }
        let Some(prior) = self.law.take_plain() else {
            return Err(Report::new(InvariantViolation::NoControlLaw));
        };
        let started = self.clock.now();
        debug!(actuator = %self.id, law = %prior.id(), duration_ms = duration.as_millis() as u64, "profile start");
        self.law = LawSlot::Profile(ProfileRun {
            prior,
            profile: Box::new(profile),
            started,
            duration,
        });
        self.set_mode(ControlMode::Position);
        Ok(())
    }

    /// Stop an in-flight profile and restore the captured law immediately.
    pub fn cancel_profile(&mut self) -> bool {
        if !matches!(self.law, LawSlot::Profile(_)) {
            return false;
        }
        if let Some(prior) = self.law.take_plain() {
            debug!(actuator = %self.id, law = %prior.id(), "profile cancelled");
            self.law = prior.into_slot();
        }
        true
    }

    pub fn profile_in_flight(&self) -> bool {
        matches!(self.law, LawSlot::Profile(_))
    }

    /// Sample the in-flight profile into the position setpoint, or restore the
    /// captured law once its duration has elapsed. Simulated controllers also
    /// move their shadow position, as any simulated setpoint write does.
    fn advance_profile(&mut self, now: Instant) {
        let LawSlot::Profile(run) = &self.law else {
            return;
        };
        let elapsed = now.saturating_duration_since(run.started);
        let finished = elapsed >= run.duration;
        let target = run.profile.sample(elapsed.min(run.duration));
        self.position_setpoint = target.position;
        if !self.is_physical() {
            self.shadow_position = target.position;
        }
        if finished {
            if let Some(prior) = self.law.take_plain() {
                debug!(actuator = %self.id, law = %prior.id(), "profile complete; law restored");
                self.law = prior.into_slot();
            }
            return;
        }
        self.set_mode(ControlMode::Position);
    }

    // ── Followers ────────────────────────────────────────────────────────────

    pub fn is_following(&self) -> bool {
        self.output.is_following()
    }

    pub fn leader(&self) -> Option<ActuatorId> {
        self.output.leader()
    }

    pub fn follower_ids(&self) -> Vec<ActuatorId> {
        self.followers.ids()
    }

    // ── Periodic update ──────────────────────────────────────────────────────

    fn snapshot(&mut self, dt: f64) -> Result<ControlState> {
        let position = self.position()?;
        let velocity = self.velocity()?;
        let acceleration = self.acceleration;
        Ok(ControlState {
            mode: self.mode,
            position,
            velocity,
            acceleration,
            linear_velocity: units::angular_to_linear_velocity(velocity, self.radius).ok(),
            linear_acceleration: units::angular_to_linear_velocity(acceleration, self.radius).ok(),
            position_setpoint: self.position_setpoint,
            velocity_setpoint: self.velocity_setpoint,
            commanded_voltage: self.commanded_voltage,
            gains: self.gains,
            max_output_voltage: self.max_output_voltage,
            dt,
        })
    }

    /// One control tick.
    ///
    /// - following: write the leader's mirrored output; the own law is skipped
    /// - no law: the held output is pushed to followers again
    /// - otherwise: advance any profile, evaluate the law, clamp, write, and
    ///   push the result to followers
    ///
    /// Returns the voltage now on the output.
    pub fn update(&mut self) -> Result<f64> {
        let now = self.clock.now();
        let dt = self
            .last_tick
            .map_or(self.nominal_tick, |t| now.saturating_duration_since(t))
            .as_secs_f64();
        self.last_tick = Some(now);

        if self.output.is_following() {
            let v = self.output.load();
            self.write_output(v)?;
            self.telemetry.publish("voltage", v);
            return Ok(v);
        }

        if !self.law.is_installed() {
            let v = self.output.load();
            self.followers.broadcast(v);
            return Ok(v);
        }
        if self.is_physical() && !self.encoder.is_configured() {
            warn!(actuator = %self.id, "tick denied: closed loop without a configured encoder");
            return Err(Report::new(InvariantViolation::EncoderNotConfigured)).wrap_err("update");
        }

        self.advance_profile(now);
        let state = self.snapshot(dt)?;
        let raw = self
            .law
            .active_mut()
            .map_or(0.0, |law| law.evaluate(&state));
        let volts = self.clamp_output(raw);
        trace!(actuator = %self.id, raw, volts, mode = %state.mode, "tick");
        self.write_output(volts)?;
        self.publish_telemetry(&state, volts);
        Ok(volts)
    }

    fn publish_telemetry(&self, state: &ControlState, volts: f64) {
        let sink = &self.telemetry;
        sink.publish("position", state.position);
        sink.publish("velocity", state.velocity);
        sink.publish("acceleration", state.acceleration);
        sink.publish("voltage", volts);
        sink.publish("position_setpoint", state.position_setpoint);
        sink.publish("velocity_setpoint", state.velocity_setpoint);
        sink.publish("mode", f64::from(state.mode.code()));
    }
}

/// Make `follower` mirror `leader`'s output.
///
/// Starts the leader's synchronization thread on its first follower. Errors if
/// the follower already follows a different leader, if ids collide, or if the
/// relationship would form a cycle.
pub fn follow<F, L>(
    follower: &mut ActuatorController<F>,
    leader: &mut ActuatorController<L>,
) -> Result<()>
where
    F: ActuatorHardware,
    L: ActuatorHardware,
{
    if follower.id == leader.id {
        return Err(Report::new(ConfigurationError::InvalidConfiguration(
            "an actuator cannot follow itself",
        )));
    }
    match follower.output.leader() {
        Some(current) if current == leader.id => return Ok(()),
        Some(_) => {
            return Err(Report::new(ConfigurationError::InvalidConfiguration(
                "actuator already follows another leader",
            )));
        }
        None => {}
    }
    if leader.output.led_by(follower.id) {
        return Err(Report::new(ConfigurationError::InvalidConfiguration(
            "follow relationship would form a cycle",
        )));
    }
    follower.output.set_leader(Some(leader.id));
    follower.output.set_upstream(&leader.output);
    leader.followers.add(
        follower.id,
        &follower.output,
        &leader.output,
        MonotonicClock::new(),
    );
    debug!(follower = %follower.id, leader = %leader.id, "follow registered");
    Ok(())
}

/// Detach `follower` from `leader`. The follower's output drops to 0 V and its
/// own law resumes on its next tick. Returns false if it was not following `leader`.
pub fn unfollow<F, L>(
    follower: &mut ActuatorController<F>,
    leader: &mut ActuatorController<L>,
) -> bool
where
    F: ActuatorHardware,
    L: ActuatorHardware,
{
    if follower.output.leader() != Some(leader.id) {
        return false;
    }
    leader.followers.remove(follower.id);
    follower.output.set_leader(None);
    if let Err(e) = follower.write_output(0.0) {
        warn!(follower = %follower.id, error = %e, "failed to zero output after unfollow");
        follower.output.store(0.0);
    }
    debug!(follower = %follower.id, leader = %leader.id, "follow removed");
    true
}
