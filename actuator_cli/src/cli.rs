//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "actuator", version, about = "Actuator control CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/actuator.toml")]
    pub config: PathBuf,

    /// Optional motion profile table (strict `t_s,position` header)
    #[arg(long = "profile-csv", value_name = "FILE")]
    pub profile_csv: Option<PathBuf>,

    /// Print telemetry and results as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides RUST_LOG and [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Drive the simulation from a virtual clock instead of wall time
    #[arg(long = "virtual-clock", action = ArgAction::SetTrue)]
    pub virtual_clock: bool,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Memory locking mode for real-time operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RtLock {
    /// Do not lock memory
    None,
    /// Lock currently resident pages
    Current,
    /// Lock current and future pages
    All,
}

impl RtLock {
    #[inline]
    pub fn os_default() -> Self {
        if cfg!(target_os = "linux") {
            RtLock::Current
        } else {
            RtLock::None
        }
    }
}

/// Real-time scheduling knobs shared by the loop-running commands.
#[derive(clap::Args, Debug, Clone, Copy, Default)]
pub struct RtArgs {
    /// Enable real-time mode (SCHED_FIFO, affinity, mlockall)
    #[arg(
        long,
        action = ArgAction::SetTrue,
        long_help = "Enable real-time mode on Linux.\n\nAttempts SCHED_FIFO priority, pins to one CPU, and locks the address space into RAM. This reduces page faults and jitter for the control loop but may require elevated privileges or ulimits (e.g., memlock). Other platforms ignore it with a warning."
    )]
    pub rt: bool,
    /// Real-time priority for SCHED_FIFO (1..=max)
    #[arg(long, value_name = "PRIO")]
    pub rt_prio: Option<i32>,
    /// Select memory locking mode for --rt: none, current, or all
    #[arg(long, value_enum, value_name = "MODE")]
    pub rt_lock: Option<RtLock>,
    /// CPU index to pin the process to when --rt is enabled (default 0)
    #[arg(long, value_name = "CPU")]
    pub rt_cpu: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Move the leader to a position along a trapezoid (or the --profile-csv table)
    Move {
        /// Target output-shaft position (rad)
        #[arg(long, allow_hyphen_values = true)]
        to: Option<f64>,
        /// Upper bound on control ticks (default: profile length plus settle time)
        #[arg(long, value_name = "N")]
        ticks: Option<u64>,
        #[command(flatten)]
        rt: RtArgs,
        /// Print control loop latency stats
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
    },
    /// Hold a velocity for a fixed number of ticks
    Hold {
        /// Output-shaft velocity setpoint (rad/s)
        #[arg(long, allow_hyphen_values = true)]
        velocity: f64,
        /// Number of control ticks
        #[arg(long, value_name = "N")]
        ticks: u64,
        #[command(flatten)]
        rt: RtArgs,
        /// Print control loop latency stats
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
    },
    /// Validate config and the encoder programming round-trip on the simulated backend
    SelfCheck,
}
