#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and motion-profile table parsing for the actuator system.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The profile CSV loader enforces headers and time ordering.
use serde::Deserialize;

/// Profile table CSV schema.
///
/// Expected headers:
/// t_s,position
///
/// Example:
/// t_s,position
/// 0.0,0.0
/// 0.5,0.25
/// 1.0,1.0
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ProfileRow {
    pub t_s: f64,
    pub position: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ActuatorCfg {
    pub id: u32,
    /// Motor revolutions per output-shaft revolution.
    pub gear_ratio: f64,
    /// Wheel/drum radius in metres; enables linear units when present.
    pub radius_m: Option<f64>,
    pub max_output_voltage: f64,
    pub current_limit_a: Option<u32>,
}

impl Default for ActuatorCfg {
    fn default() -> Self {
        Self {
            id: 0,
            gear_ratio: 1.0,
            radius_m: None,
            max_output_voltage: 12.0,
            current_limit_a: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EncoderKind {
    #[default]
    None,
    HallEffect,
    Quadrature,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct EncoderCfg {
    pub kind: EncoderKind,
    pub counts_per_revolution: u32,
    pub reversed: bool,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct GainsCfg {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ConstraintsCfg {
    /// rad/s at the output shaft
    pub max_velocity: f64,
    /// rad/s^2 at the output shaft
    pub max_acceleration: f64,
}

impl Default for ConstraintsCfg {
    fn default() -> Self {
        Self {
            max_velocity: 1.0,
            max_acceleration: 1.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedforwardKind {
    #[default]
    Simple,
    Arm,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FeedforwardCfg {
    pub kind: FeedforwardKind,
    pub ks: f64,
    pub kv: f64,
    pub ka: f64,
    /// Gravity term; arm only.
    pub kg: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoopCfg {
    /// Control tick period (ms)
    pub tick_ms: u64,
    /// Follower synchronization period (ms)
    pub follower_sync_ms: u64,
}

impl Default for LoopCfg {
    fn default() -> Self {
        Self {
            tick_ms: 20,
            follower_sync_ms: 5,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FollowerCfg {
    pub id: u32,
    #[serde(default = "default_gear_ratio")]
    pub gear_ratio: f64,
}

fn default_gear_ratio() -> f64 {
    1.0
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub actuator: ActuatorCfg,
    #[serde(default)]
    pub encoder: EncoderCfg,
    #[serde(default)]
    pub gains: GainsCfg,
    #[serde(default)]
    pub constraints: ConstraintsCfg,
    /// Optional feedforward model installed with the correction law
    #[serde(default)]
    pub feedforward: Option<FeedforwardCfg>,
    #[serde(default, rename = "loop")]
    pub loop_: LoopCfg,
    #[serde(default)]
    pub followers: Vec<FollowerCfg>,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Validate profile rows: at least two, finite, strictly increasing time.
pub fn validate_profile_rows(rows: &[ProfileRow]) -> eyre::Result<()> {
    if rows.len() < 2 {
        eyre::bail!("profile requires at least two rows, got {}", rows.len());
    }
    for (i, r) in rows.iter().enumerate() {
        if !(r.t_s.is_finite() && r.position.is_finite()) {
            eyre::bail!("profile row {} has a non-finite value", i + 2);
        }
    }
    for (i, w) in rows.windows(2).enumerate() {
        if w[1].t_s <= w[0].t_s {
            eyre::bail!(
                "profile t_s must be strictly increasing (rows {} and {})",
                i + 2,
                i + 3
            );
        }
    }
    Ok(())
}

pub fn load_profile_csv(path: &std::path::Path) -> eyre::Result<Vec<ProfileRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open profile CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["t_s", "position"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "profile CSV must have headers 't_s,position', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<ProfileRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    validate_profile_rows(&rows)?;
    Ok(rows)
}

fn positive_finite(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Actuator
        if !positive_finite(self.actuator.gear_ratio) {
            eyre::bail!("actuator.gear_ratio must be positive and finite");
        }
        if let Some(r) = self.actuator.radius_m
            && !positive_finite(r)
        {
            eyre::bail!("actuator.radius_m must be positive and finite");
        }
        if !positive_finite(self.actuator.max_output_voltage) {
            eyre::bail!("actuator.max_output_voltage must be positive and finite");
        }
        if self.actuator.current_limit_a == Some(0) {
            eyre::bail!("actuator.current_limit_a must be >= 1");
        }

        // Encoder
        if self.encoder.kind != EncoderKind::None && self.encoder.counts_per_revolution == 0 {
            eyre::bail!("encoder.counts_per_revolution must be > 0 when an encoder kind is set");
        }

        // Gains
        let g = &self.gains;
        if !(g.kp.is_finite() && g.ki.is_finite() && g.kd.is_finite()) {
            eyre::bail!("gains must be finite");
        }
        if g.kp < 0.0 || g.ki < 0.0 || g.kd < 0.0 {
            eyre::bail!("gains must be >= 0");
        }

        // Constraints
        if !positive_finite(self.constraints.max_velocity) {
            eyre::bail!("constraints.max_velocity must be positive and finite");
        }
        if !positive_finite(self.constraints.max_acceleration) {
            eyre::bail!("constraints.max_acceleration must be positive and finite");
        }

        // Feedforward
        if let Some(ff) = &self.feedforward {
            if ![ff.ks, ff.kv, ff.ka, ff.kg].iter().all(|k| k.is_finite()) {
                eyre::bail!("feedforward coefficients must be finite");
            }
            match (ff.kind, self.actuator.radius_m) {
                (FeedforwardKind::Arm, Some(_)) => {
                    eyre::bail!("feedforward.kind = \"arm\" cannot be combined with actuator.radius_m");
                }
                (FeedforwardKind::Simple, None) => {
                    eyre::bail!("feedforward.kind = \"simple\" requires actuator.radius_m");
                }
                _ => {}
            }
        }

        // Loop
        if !(1..=1000).contains(&self.loop_.tick_ms) {
            eyre::bail!("loop.tick_ms must be in 1..=1000");
        }
        if self.loop_.follower_sync_ms == 0 || self.loop_.follower_sync_ms > self.loop_.tick_ms {
            eyre::bail!("loop.follower_sync_ms must be in 1..=loop.tick_ms");
        }

        // Followers
        let mut seen = vec![self.actuator.id];
        for f in &self.followers {
            if seen.contains(&f.id) {
                eyre::bail!("followers: duplicate actuator id {}", f.id);
            }
            seen.push(f.id);
            if !positive_finite(f.gear_ratio) {
                eyre::bail!("followers[{}].gear_ratio must be positive and finite", f.id);
            }
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
