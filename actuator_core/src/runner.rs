//! Fixed-cadence driver for `ActuatorController::update`.
//!
//! The host owns the loop timing; the controller only reacts to ticks. These
//! helpers run a bounded number of ticks against an injected clock and report
//! loop latency, so the same loop works in real time and under `ManualClock`.

use std::time::Duration;

use actuator_traits::ActuatorHardware;
use actuator_traits::clock::Clock;

use crate::controller::ActuatorController;
use crate::error::Result;
use crate::util::remaining_in_tick;

/// Summary of a run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunStats {
    pub ticks: u64,
    /// Ticks whose update took longer than the tick period.
    pub missed_deadlines: u64,
    pub min_latency: Duration,
    pub avg_latency: Duration,
    pub max_latency: Duration,
    /// Output voltage after the last tick.
    pub final_voltage: f64,
    /// True when the stop predicate ended the run before `max_ticks`.
    pub stopped_early: bool,
}

#[derive(Default)]
struct LatencyAcc {
    n: u64,
    total: Duration,
    min: Option<Duration>,
    max: Duration,
    missed: u64,
}

impl LatencyAcc {
    fn record(&mut self, spent: Duration, tick: Duration) {
        self.n += 1;
        self.total += spent;
        self.min = Some(self.min.map_or(spent, |m| m.min(spent)));
        self.max = self.max.max(spent);
        if spent > tick {
            self.missed += 1;
        }
    }

    fn finish(self, final_voltage: f64, stopped_early: bool) -> RunStats {
        let avg = if self.n == 0 {
            Duration::ZERO
        } else {
            self.total / u32::try_from(self.n).unwrap_or(u32::MAX)
        };
        RunStats {
            ticks: self.n,
            missed_deadlines: self.missed,
            min_latency: self.min.unwrap_or_default(),
            avg_latency: avg,
            max_latency: self.max,
            final_voltage,
            stopped_early,
        }
    }
}

/// Run exactly `ticks` updates, one per `tick`.
pub fn run_for<H, C>(
    controller: &mut ActuatorController<H>,
    ticks: u64,
    tick: Duration,
    clock: &C,
) -> Result<RunStats>
where
    H: ActuatorHardware,
    C: Clock + ?Sized,
{
    run_until(controller, ticks, tick, clock, |_| false)
}

/// Run up to `max_ticks` updates, stopping early once `done` returns true.
/// `done` is checked after every tick. An update error aborts the run after a
/// best-effort idle.
pub fn run_until<H, C, F>(
    controller: &mut ActuatorController<H>,
    max_ticks: u64,
    tick: Duration,
    clock: &C,
    mut done: F,
) -> Result<RunStats>
where
    H: ActuatorHardware,
    C: Clock + ?Sized,
    F: FnMut(&mut ActuatorController<H>) -> bool,
{
    let mut acc = LatencyAcc::default();
    let mut last_voltage = controller.output_voltage();
    tracing::debug!(actuator = %controller.id(), max_ticks, tick_ms = tick.as_millis() as u64, "run start");

    for _ in 0..max_ticks {
        let started = clock.now();
        match controller.update() {
            Ok(v) => last_voltage = v,
            Err(e) => {
                if let Err(stop) = controller.idle() {
                    tracing::warn!(error = %stop, "idle after failed tick also failed");
                }
                tracing::error!(actuator = %controller.id(), error = %e, "run aborted");
                return Err(e);
            }
        }
        let spent = clock.elapsed_since(started);
        acc.record(spent, tick);
        if done(controller) {
            let stats = acc.finish(last_voltage, true);
            tracing::debug!(?stats, "run stopped early");
            return Ok(stats);
        }
        clock.sleep(remaining_in_tick(tick, spent));
    }

    let stats = acc.finish(last_voltage, false);
    tracing::debug!(?stats, "run complete");
    Ok(stats)
}
