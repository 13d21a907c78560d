//! Telemetry sinks backed by `tracing`.

use actuator_traits::TelemetrySink;

use crate::ActuatorId;

/// Forwards every property as a `trace!` event on the `telemetry` target.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    actuator: ActuatorId,
}

impl TracingSink {
    pub fn new(actuator: ActuatorId) -> Self {
        Self { actuator }
    }
}

impl TelemetrySink for TracingSink {
    fn publish(&self, name: &str, value: f64) {
        tracing::trace!(target: "telemetry", actuator = %self.actuator, name, value);
    }
}

/// Fans one property out to several sinks.
#[derive(Default)]
pub struct TeeSink {
    sinks: Vec<Box<dyn TelemetrySink>>,
}

impl TeeSink {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, sink: impl TelemetrySink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl TelemetrySink for TeeSink {
    fn publish(&self, name: &str, value: f64) {
        for s in &self.sinks {
            s.publish(name, value);
        }
    }
}
