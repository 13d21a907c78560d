//! `From` implementations bridging `actuator_config` types to `actuator_core` types.

use std::time::Duration;

use actuator_traits::{EncoderConfig, EncoderKind};

use crate::ActuatorId;
use crate::config::{Constraints, Gains, LoopCfg};
use crate::error::ConfigurationError;
use crate::feedforward::{ArmFeedforward, SimpleMotorFeedforward};
use crate::profile::TabulatedProfile;

// ── Encoder ──────────────────────────────────────────────────────────────────

/// Encoder types live in `actuator_traits`, so these are free functions rather
/// than `From` impls.
pub fn encoder_kind_from_config(k: actuator_config::EncoderKind) -> EncoderKind {
    match k {
        actuator_config::EncoderKind::None => EncoderKind::None,
        actuator_config::EncoderKind::HallEffect => EncoderKind::HallEffect,
        actuator_config::EncoderKind::Quadrature => EncoderKind::Quadrature,
    }
}

pub fn encoder_from_config(c: &actuator_config::EncoderCfg) -> EncoderConfig {
    EncoderConfig::new(c.counts_per_revolution, encoder_kind_from_config(c.kind))
        .reversed(c.reversed)
}

// ── Gains / constraints ──────────────────────────────────────────────────────

impl From<&actuator_config::GainsCfg> for Gains {
    fn from(c: &actuator_config::GainsCfg) -> Self {
        Self::new(c.kp, c.ki, c.kd)
    }
}

impl From<&actuator_config::ConstraintsCfg> for Constraints {
    fn from(c: &actuator_config::ConstraintsCfg) -> Self {
        Self::new(c.max_velocity, c.max_acceleration)
    }
}

// ── Loop timing ──────────────────────────────────────────────────────────────

impl From<&actuator_config::LoopCfg> for LoopCfg {
    fn from(c: &actuator_config::LoopCfg) -> Self {
        Self {
            tick: Duration::from_millis(c.tick_ms),
            follower_sync: Duration::from_millis(c.follower_sync_ms),
        }
    }
}

// ── Feedforward ──────────────────────────────────────────────────────────────

impl From<&actuator_config::FeedforwardCfg> for SimpleMotorFeedforward {
    fn from(c: &actuator_config::FeedforwardCfg) -> Self {
        Self::new(c.ks, c.kv, c.ka)
    }
}

impl From<&actuator_config::FeedforwardCfg> for ArmFeedforward {
    fn from(c: &actuator_config::FeedforwardCfg) -> Self {
        Self::new(c.ks, c.kg, c.kv, c.ka)
    }
}

// ── Profile table ────────────────────────────────────────────────────────────

impl TryFrom<&[actuator_config::ProfileRow]> for TabulatedProfile {
    type Error = ConfigurationError;
    fn try_from(rows: &[actuator_config::ProfileRow]) -> Result<Self, Self::Error> {
        Self::new(rows.iter().map(|r| (r.t_s, r.position)).collect())
    }
}

// ── Identifiers ──────────────────────────────────────────────────────────────

impl From<&actuator_config::FollowerCfg> for ActuatorId {
    fn from(c: &actuator_config::FollowerCfg) -> Self {
        Self(c.id)
    }
}
