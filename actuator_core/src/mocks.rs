//! Test and helper mocks for actuator_core.
//!
//! Both types are cheap handles over shared state: keep a clone in the test
//! and hand the other to the controller.

use std::sync::{Arc, Mutex, MutexGuard};

use actuator_traits::{ActuatorHardware, EncoderConfig, HwResult, TelemetrySink};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Records every published property in order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<(String, f64)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent value published under `name`.
    pub fn last(&self, name: &str) -> Option<f64> {
        lock(&self.records)
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn values(&self, name: &str) -> Vec<f64> {
        lock(&self.records)
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.records).clear();
    }
}

impl TelemetrySink for MemorySink {
    fn publish(&self, name: &str, value: f64) {
        lock(&self.records).push((name.to_owned(), value));
    }
}

/// Everything a `RecordingHardware` saw or was told to report.
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    /// Raw position returned by reads (counts).
    pub raw_position: f64,
    /// Raw velocity returned by reads (counts/s).
    pub raw_velocity: f64,
    pub reject_encoder: bool,
    pub fail_writes: bool,
    pub voltages: Vec<f64>,
    pub current_limits: Vec<u32>,
    pub encoders: Vec<EncoderConfig>,
    pub gains: Vec<(f64, f64, f64)>,
    pub multipliers: Vec<(f64, f64)>,
}

/// Hardware double with scripted reads and recorded writes.
#[derive(Debug, Clone, Default)]
pub struct RecordingHardware {
    state: Arc<Mutex<Recorded>>,
}

impl RecordingHardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// A device that refuses every encoder configuration.
    pub fn rejecting_encoders() -> Self {
        let hw = Self::new();
        hw.set_reject_encoder(true);
        hw
    }

    pub fn set_raw_position(&self, counts: f64) {
        lock(&self.state).raw_position = counts;
    }

    pub fn set_raw_velocity(&self, counts_per_sec: f64) {
        lock(&self.state).raw_velocity = counts_per_sec;
    }

    pub fn set_reject_encoder(&self, reject: bool) {
        lock(&self.state).reject_encoder = reject;
    }

    /// Make every voltage write fail with a bus error.
    pub fn set_fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }

    pub fn snapshot(&self) -> Recorded {
        lock(&self.state).clone()
    }

    pub fn voltages(&self) -> Vec<f64> {
        lock(&self.state).voltages.clone()
    }

    pub fn last_voltage(&self) -> Option<f64> {
        lock(&self.state).voltages.last().copied()
    }
}

impl ActuatorHardware for RecordingHardware {
    fn read_raw_position(&mut self) -> HwResult<f64> {
        Ok(lock(&self.state).raw_position)
    }

    fn read_raw_velocity(&mut self) -> HwResult<f64> {
        Ok(lock(&self.state).raw_velocity)
    }

    fn write_voltage(&mut self, volts: f64) -> HwResult<()> {
        let mut s = lock(&self.state);
        if s.fail_writes {
            return Err(Box::new(std::io::Error::other("bus write failed")));
        }
        s.voltages.push(volts);
        Ok(())
    }

    fn write_current_limit(&mut self, amps: u32) -> HwResult<()> {
        lock(&self.state).current_limits.push(amps);
        Ok(())
    }

    fn program_encoder(&mut self, cfg: &EncoderConfig) -> bool {
        let mut s = lock(&self.state);
        if s.reject_encoder {
            return false;
        }
        s.encoders.push(*cfg);
        true
    }

    fn program_gains(&mut self, p: f64, i: f64, d: f64) -> HwResult<()> {
        lock(&self.state).gains.push((p, i, d));
        Ok(())
    }

    fn program_conversion_multipliers(&mut self, velocity: f64, position: f64) -> HwResult<()> {
        lock(&self.state).multipliers.push((velocity, position));
        Ok(())
    }
}
