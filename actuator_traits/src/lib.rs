//! Capability seams between the actuator control core and the outside world.
//!
//! - `ActuatorHardware`: the narrow hardware handle a backend implements
//! - `TelemetrySink`: best-effort named numeric property publication
//! - `Clock`: monotonic time for profiles and the update loop
pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Error type crossing the hardware boundary.
pub type HwResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Encoder family attached to the motor shaft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncoderKind {
    #[default]
    None,
    HallEffect,
    Quadrature,
}

/// Encoder resolution, family and polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncoderConfig {
    pub counts_per_revolution: u32,
    pub kind: EncoderKind,
    pub reversed: bool,
}

impl EncoderConfig {
    pub const fn new(counts_per_revolution: u32, kind: EncoderKind) -> Self {
        Self {
            counts_per_revolution,
            kind,
            reversed: false,
        }
    }

    pub const fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    /// True when the encoder can report shaft position: a real encoder kind
    /// with a non-zero resolution.
    pub fn is_configured(&self) -> bool {
        self.kind != EncoderKind::None && self.counts_per_revolution > 0
    }
}

/// Hardware handle for one motor controller.
///
/// Raw readings are in encoder counts (position) and counts per second
/// (velocity), measured at the motor shaft before any gearing.
pub trait ActuatorHardware {
    fn read_raw_position(&mut self) -> HwResult<f64>;
    fn read_raw_velocity(&mut self) -> HwResult<f64>;
    fn write_voltage(&mut self, volts: f64) -> HwResult<()>;
    fn write_current_limit(&mut self, amps: u32) -> HwResult<()>;
    /// Program the encoder; `false` means the device rejected the configuration.
    fn program_encoder(&mut self, cfg: &EncoderConfig) -> bool;
    fn program_gains(&mut self, p: f64, i: f64, d: f64) -> HwResult<()>;
    /// Program on-device unit scaling (velocity multiplier, position multiplier)
    /// used by device-side closed loops. Readings returned through this trait
    /// stay in raw counts.
    fn program_conversion_multipliers(&mut self, velocity: f64, position: f64) -> HwResult<()>;
}

impl<H: ActuatorHardware + ?Sized> ActuatorHardware for Box<H> {
    fn read_raw_position(&mut self) -> HwResult<f64> {
        (**self).read_raw_position()
    }
    fn read_raw_velocity(&mut self) -> HwResult<f64> {
        (**self).read_raw_velocity()
    }
    fn write_voltage(&mut self, volts: f64) -> HwResult<()> {
        (**self).write_voltage(volts)
    }
    fn write_current_limit(&mut self, amps: u32) -> HwResult<()> {
        (**self).write_current_limit(amps)
    }
    fn program_encoder(&mut self, cfg: &EncoderConfig) -> bool {
        (**self).program_encoder(cfg)
    }
    fn program_gains(&mut self, p: f64, i: f64, d: f64) -> HwResult<()> {
        (**self).program_gains(p, i, d)
    }
    fn program_conversion_multipliers(&mut self, velocity: f64, position: f64) -> HwResult<()> {
        (**self).program_conversion_multipliers(velocity, position)
    }
}

/// Destination for named numeric properties. Publication never blocks the
/// control loop and carries no delivery guarantee.
pub trait TelemetrySink: Send {
    fn publish(&self, name: &str, value: f64);
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn publish(&self, _name: &str, _value: f64) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoder_configured_requires_kind_and_counts() {
        assert!(!EncoderConfig::default().is_configured());
        assert!(!EncoderConfig::new(0, EncoderKind::Quadrature).is_configured());
        assert!(!EncoderConfig::new(4096, EncoderKind::None).is_configured());
        assert!(EncoderConfig::new(42, EncoderKind::HallEffect).is_configured());
    }
}
