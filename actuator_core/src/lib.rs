#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Actuator control core (hardware-agnostic).
//!
//! This crate turns a narrow hardware handle (`actuator_traits::ActuatorHardware`)
//! into a closed-loop actuator controller. The same controller runs against
//! real hardware or, with no hardware attached, against in-memory shadow values.
//!
//! ## Architecture
//!
//! - **Units**: rotational/linear conversion and encoder count scaling (`units`)
//! - **Modes**: one active control domain at a time (`mode`)
//! - **Laws**: replaceable `ControlState -> volts` functions; PID correction,
//!   linear and arm feedforward (`law`, `pid`, `feedforward`)
//! - **Profiles**: time-parameterized setpoints that temporarily drive a law (`profile`)
//! - **Followers**: leader output mirrored into followers by a sync thread (`follower`)
//! - **Loop**: `ActuatorController::update` is one tick; `runner` drives ticks
//!
//! Angles are radians at the output shaft, lengths metres, times seconds.

pub mod atomic;
pub mod builder;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod error;
pub mod feedforward;
pub mod follower;
pub mod hw_error;
pub mod law;
pub mod mocks;
pub mod mode;
pub mod pid;
pub mod profile;
pub mod runner;
pub mod telemetry;
pub mod units;
pub mod util;

use std::fmt;

pub use builder::{ActuatorBuilder, InitialLaw};
pub use config::{Constraints, Gains, LoopCfg};
pub use controller::{ActuatorController, BoxedHardware, follow, unfollow};
pub use error::{
    ActuatorError, BuildError, ConfigurationError, InvariantViolation, Report, Result,
};
pub use feedforward::{
    ArmFeedforward, LinearFeedforward, RotationalFeedforward, SimpleMotorFeedforward,
};
pub use law::{ControlLaw, ControlState, LawId, LawKind};
pub use mode::ControlMode;
pub use profile::{MotionProfile, ProfileState, TabulatedProfile, TrapezoidProfile};
pub use runner::{RunStats, run_for, run_until};

pub use actuator_traits::{EncoderConfig, EncoderKind};

/// Caller-supplied actuator identity, unique within one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActuatorId(pub u32);

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actuator#{}", self.0)
    }
}
