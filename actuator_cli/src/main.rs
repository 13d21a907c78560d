mod cli;
mod error_fmt;
mod jsonl;
mod rt;
mod run;

use std::path::Path;

use actuator_config::Config;
use clap::Parser;
use eyre::{Result, WrapErr};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{InputFile, exit_code_for_error, format_error_json, humanize};
use crate::rt::setup_rt_once;
use crate::run::{Rig, print_stats, run_hold, run_move, self_check, shutdown_flag};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let code = match run(cli) {
        Ok(()) => 0,
        Err(err) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                println!("{}", format_error_json(&err));
            } else {
                eprintln!("{}", humanize(&err));
            }
            tracing::debug!(error = ?err, "command failed");
            exit_code_for_error(&err)
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<()> {
    let _ = color_eyre::install();

    let cfg = load_config(&cli.config)?;
    // Dropped when the command returns so the file writer flushes before exit
    let _log_guard = init_tracing(cli.json, cli.log_level.as_deref(), &cfg)?;
    cfg.validate()
        .wrap_err(InputFile(cli.config.clone()))?;

    let table = match &cli.profile_csv {
        Some(path) => Some(
            actuator_config::load_profile_csv(path).wrap_err(InputFile(path.clone()))?,
        ),
        None => None,
    };

    let shutdown = shutdown_flag();
    let mut rig = Rig::build(&cfg, cli.virtual_clock, cli.json)?;

    match cli.cmd {
        Commands::Move {
            to,
            ticks,
            rt,
            stats,
        } => {
            setup_rt_once(rt);
            let outcome = run_move(&mut rig, to, table.as_deref(), ticks, &shutdown)?;
            if stats {
                print_stats(&outcome.stats, rig.tick());
            }
            outcome.print(cli.json);
        }
        Commands::Hold {
            velocity,
            ticks,
            rt,
            stats,
        } => {
            setup_rt_once(rt);
            let outcome = run_hold(&mut rig, velocity, ticks, &shutdown)?;
            if stats {
                print_stats(&outcome.stats, rig.tick());
            }
            outcome.print(cli.json);
        }
        Commands::SelfCheck => self_check(&mut rig, cli.json)?,
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path).wrap_err(InputFile(path.to_path_buf()))?;
    actuator_config::load_toml(&text).wrap_err(InputFile(path.to_path_buf()))
}

/// Console logs go to stderr so stdout stays machine-readable. Precedence for
/// the level: `--log-level`, then `RUST_LOG`, then `[logging].level`, then info.
fn init_tracing(
    json: bool,
    cli_level: Option<&str>,
    cfg: &Config,
) -> Result<Option<WorkerGuard>> {
    let filter = match cli_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(cfg.logging.level.as_deref().unwrap_or("info")))?,
    };

    let mut guard = None;
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if json {
        layers.push(fmt::layer().json().with_writer(std::io::stderr).boxed());
    } else {
        layers.push(fmt::layer().with_writer(std::io::stderr).boxed());
    }

    if let Some(file) = &cfg.logging.file {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file}"))?;
        let appender = match cfg.logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        guard = Some(file_guard);
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .wrap_err("installing tracing subscriber")?;
    Ok(guard)
}
