//! Command execution: assemble the simulated rig from config and drive it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use actuator_config::{Config, ProfileRow};
use actuator_core::conversions::encoder_from_config;
use actuator_core::telemetry::{TeeSink, TracingSink};
use actuator_core::util::ticks_for;
use actuator_core::{
    ActuatorController, ActuatorId, ConfigurationError, InvariantViolation, MotionProfile,
    RunStats, TabulatedProfile, TrapezoidProfile, follow, run_for, run_until,
};
use actuator_hardware::{MotorModel, SimProbe, SimulatedActuator};
use actuator_traits::clock::{Clock, ManualClock, MonotonicClock};
use eyre::{Result, WrapErr};
use serde_json::json;

use crate::jsonl::JsonLinesSink;

/// Ticks allowed after a profile ends for the loop to settle on the goal.
const SETTLE_TICKS: u64 = 250;
/// A move is done once the output shaft is this close to the goal (rad).
const POSITION_TOLERANCE: f64 = 1e-3;

/// Wall time, or a virtual clock that jumps ahead on every sleep.
#[derive(Clone)]
pub enum SimClock {
    Wall(MonotonicClock),
    Virtual(ManualClock),
}

impl Clock for SimClock {
    fn now(&self) -> Instant {
        match self {
            SimClock::Wall(c) => c.now(),
            SimClock::Virtual(c) => c.now(),
        }
    }

    fn sleep(&self, d: Duration) {
        match self {
            SimClock::Wall(c) => c.sleep(d),
            SimClock::Virtual(c) => c.sleep(d),
        }
    }
}

type SimController = ActuatorController<SimulatedActuator<SimClock>>;

/// Leader plus configured followers, all on simulated plants sharing one clock.
pub struct Rig {
    leader: SimController,
    probe: SimProbe,
    followers: Vec<SimController>,
    clock: SimClock,
    tick: Duration,
    jsonl: Option<JsonLinesSink>,
}

impl Rig {
    pub fn build(cfg: &Config, virtual_clock: bool, json: bool) -> Result<Self> {
        let clock = if virtual_clock {
            SimClock::Virtual(ManualClock::new())
        } else {
            SimClock::Wall(MonotonicClock::new())
        };
        let leader_id = ActuatorId(cfg.actuator.id);
        let plant = SimulatedActuator::with_clock(MotorModel::default(), clock.clone());
        let probe = plant.probe();

        let jsonl = json.then(|| JsonLinesSink::new(leader_id));
        let builder = ActuatorController::builder(leader_id)
            .with_config(cfg)
            .with_hardware(plant)
            .with_clock(clock.clone());
        let builder = match &jsonl {
            Some(sink) => builder.with_telemetry(
                TeeSink::new()
                    .with(sink.clone())
                    .with(TracingSink::new(leader_id)),
            ),
            None => builder.with_telemetry(TracingSink::new(leader_id)),
        };
        let mut leader = builder.build().wrap_err("building leader")?;

        let mut followers = Vec::with_capacity(cfg.followers.len());
        for fcfg in &cfg.followers {
            let id = ActuatorId::from(fcfg);
            let mut follower = ActuatorController::builder(id)
                .with_hardware(SimulatedActuator::with_clock(
                    MotorModel::default(),
                    clock.clone(),
                ))
                .with_clock(clock.clone())
                .with_gear_ratio(fcfg.gear_ratio)
                .with_max_output_voltage(cfg.actuator.max_output_voltage)
                .with_encoder(encoder_from_config(&cfg.encoder))
                .build()
                .wrap_err_with(|| format!("building follower {id}"))?;
            follow(&mut follower, &mut leader)?;
            followers.push(follower);
        }
        tracing::info!(
            leader = %leader_id,
            followers = followers.len(),
            tick_ms = cfg.loop_.tick_ms,
            virtual_clock,
            "rig ready"
        );

        Ok(Self {
            leader,
            probe,
            followers,
            clock,
            tick: Duration::from_millis(cfg.loop_.tick_ms),
            jsonl,
        })
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Run up to `max_ticks` leader ticks, ticking every follower after its
    /// leader. Stops early on `done` or on a shutdown request.
    fn drive(
        &mut self,
        max_ticks: u64,
        shutdown: &AtomicBool,
        mut done: impl FnMut(&mut SimController) -> bool,
    ) -> Result<RunStats> {
        let Rig {
            leader,
            followers,
            clock,
            tick,
            ..
        } = self;
        let mut follower_err = None;
        let stats = run_until(leader, max_ticks, *tick, clock, |lead| {
            for f in followers.iter_mut() {
                if let Err(e) = f.update() {
                    follower_err = Some(e.wrap_err(format!("follower {}", f.id())));
                    return true;
                }
            }
            shutdown.load(Ordering::Relaxed) || done(lead)
        });
        if let Some(jsonl) = &self.jsonl {
            jsonl.flush();
        }
        let stats = stats?;
        if let Some(e) = follower_err {
            return Err(e);
        }
        if shutdown.load(Ordering::Relaxed) {
            self.leader.idle()?;
            eyre::bail!("interrupted by signal");
        }
        Ok(stats)
    }

    fn follower_voltages(&self) -> Vec<serde_json::Value> {
        self.followers
            .iter()
            .map(|f| json!({ "actuator": f.id().0, "voltage": f.output_voltage() }))
            .collect()
    }
}

/// What a loop-running command achieved.
pub struct Outcome {
    pub command: &'static str,
    pub actuator: ActuatorId,
    pub quantity: &'static str,
    pub target: f64,
    pub achieved: f64,
    pub stats: RunStats,
    pub followers: Vec<serde_json::Value>,
}

impl Outcome {
    pub fn print(&self, json: bool) {
        if json {
            println!(
                "{}",
                json!({
                    "command": self.command,
                    "actuator": self.actuator.0,
                    "quantity": self.quantity,
                    "target": self.target,
                    "achieved": self.achieved,
                    "ticks": self.stats.ticks,
                    "missed_deadlines": self.stats.missed_deadlines,
                    "avg_latency_us": u64::try_from(self.stats.avg_latency.as_micros()).unwrap_or(u64::MAX),
                    "max_latency_us": u64::try_from(self.stats.max_latency.as_micros()).unwrap_or(u64::MAX),
                    "stopped_early": self.stats.stopped_early,
                    "final_voltage": self.stats.final_voltage,
                    "followers": self.followers,
                })
            );
        } else {
            println!(
                "{} complete: {} {} {:.4} (target {:.4}) after {} ticks",
                self.command, self.actuator, self.quantity, self.achieved, self.target, self.stats.ticks
            );
        }
    }
}

/// Move the leader along a trapezoid to `to`, or along a tabulated profile.
pub fn run_move(
    rig: &mut Rig,
    to: Option<f64>,
    table: Option<&[ProfileRow]>,
    ticks: Option<u64>,
    shutdown: &AtomicBool,
) -> Result<Outcome> {
    let start = rig.leader.position().wrap_err("reading start position")?;
    let (goal, duration) = match (to, table) {
        (Some(goal), None) => {
            let profile = TrapezoidProfile::new(rig.leader.constraints(), start, goal)?;
            let duration = profile.total_time();
            rig.leader.follow_profile(profile, duration)?;
            (goal, duration)
        }
        (None, Some(rows)) => {
            let profile = TabulatedProfile::try_from(rows)?;
            let duration = profile.total_time();
            let goal = profile.sample(duration).position;
            rig.leader.follow_profile(profile, duration)?;
            (goal, duration)
        }
        (Some(_), Some(_)) => {
            return Err(ConfigurationError::InvalidConfiguration(
                "--to and --profile-csv are mutually exclusive",
            )
            .into());
        }
        (None, None) => {
            return Err(ConfigurationError::InvalidConfiguration(
                "move needs --to or --profile-csv",
            )
            .into());
        }
    };
    tracing::info!(start, goal, duration_ms = duration.as_millis() as u64, "move start");

    let max_ticks = ticks.unwrap_or_else(|| ticks_for(duration, rig.tick) + SETTLE_TICKS);
    let stats = rig.drive(max_ticks, shutdown, |lead| {
        !lead.profile_in_flight()
            && lead
                .position()
                .is_ok_and(|p| (p - goal).abs() < POSITION_TOLERANCE)
    })?;
    let achieved = rig.leader.position()?;
    tracing::info!(achieved, goal, ticks = stats.ticks, "move complete");

    Ok(Outcome {
        command: "move",
        actuator: rig.leader.id(),
        quantity: "position",
        target: goal,
        achieved,
        stats,
        followers: rig.follower_voltages(),
    })
}

/// Hold a velocity setpoint for `ticks` control ticks.
pub fn run_hold(rig: &mut Rig, velocity: f64, ticks: u64, shutdown: &AtomicBool) -> Result<Outcome> {
    rig.leader.set_velocity(velocity)?;
    tracing::info!(velocity, ticks, "hold start");
    let stats = rig.drive(ticks, shutdown, |_| false)?;
    let achieved = rig.leader.velocity()?;

    Ok(Outcome {
        command: "hold",
        actuator: rig.leader.id(),
        quantity: "velocity",
        target: velocity,
        achieved,
        stats,
        followers: rig.follower_voltages(),
    })
}

/// Confirm the device accepted the encoder and reports positions through it.
pub fn self_check(rig: &mut Rig, json: bool) -> Result<()> {
    let enc = rig.leader.encoder_config();
    if !enc.is_configured() {
        return Err(InvariantViolation::EncoderNotConfigured.into());
    }
    let plant = rig.probe.snapshot();
    if plant.encoder != enc {
        eyre::bail!("device encoder {:?} differs from requested {:?}", plant.encoder, enc);
    }
    let position = rig.leader.position().wrap_err("encoder read-back")?;
    // One tick with zero output keeps the plant still
    let stats = run_for(&mut rig.leader, 1, rig.tick, &rig.clock)?;
    if let Some(jsonl) = &rig.jsonl {
        jsonl.flush();
    }

    let (velocity_mult, position_mult) = plant.conversion;
    if json {
        println!(
            "{}",
            json!({
                "self_check": "ok",
                "actuator": rig.leader.id().0,
                "encoder": format!("{:?}", enc.kind),
                "counts_per_revolution": enc.counts_per_revolution,
                "radians_per_count": position_mult,
                "velocity_multiplier": velocity_mult,
                "position": position,
                "law": rig.leader.law_kind().map(|k| format!("{k:?}")),
                "followers": rig.followers.len(),
                "ticks": stats.ticks,
            })
        );
    } else {
        println!(
            "self-check ok: {} encoder {:?} at {} cpr ({:.6} rad/count), {} follower(s)",
            rig.leader.id(),
            enc.kind,
            enc.counts_per_revolution,
            position_mult,
            rig.followers.len()
        );
    }
    Ok(())
}

/// Print latency stats to stderr.
pub fn print_stats(stats: &RunStats, tick: Duration) {
    eprintln!("\n--- Actuator Loop Stats ---");
    eprintln!("Ticks: {}", stats.ticks);
    eprintln!("Period (us): {}", tick.as_micros());
    eprintln!(
        "Latency min/avg/max (us): {} / {} / {}",
        stats.min_latency.as_micros(),
        stats.avg_latency.as_micros(),
        stats.max_latency.as_micros()
    );
    eprintln!("Missed deadlines (> period): {}", stats.missed_deadlines);
    eprintln!("---------------------------\n");
}

/// Shared flag flipped by the Ctrl-C handler.
pub fn shutdown_flag() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    if let Err(e) = ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::Relaxed);
    }) {
        tracing::warn!(error = %e, "Ctrl-C handler not installed");
    }
    flag
}
