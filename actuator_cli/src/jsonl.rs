//! JSON-lines telemetry: one object per controller tick on stdout.

use std::io::Write;
use std::sync::{Arc, Mutex};

use actuator_core::ActuatorId;
use actuator_traits::TelemetrySink;
use serde_json::{Map, Value};

#[derive(Default)]
struct Pending {
    tick: u64,
    fields: Map<String, Value>,
}

/// Collects the properties a controller publishes during one tick and emits
/// them as a single JSON object. A property name repeating marks the start of
/// the next tick; `flush` emits whatever is still pending.
#[derive(Clone)]
pub struct JsonLinesSink {
    actuator: ActuatorId,
    pending: Arc<Mutex<Pending>>,
}

impl JsonLinesSink {
    pub fn new(actuator: ActuatorId) -> Self {
        Self {
            actuator,
            pending: Arc::new(Mutex::new(Pending::default())),
        }
    }

    pub fn flush(&self) {
        if let Ok(mut p) = self.pending.lock() {
            self.emit(&mut p);
        }
    }

    fn emit(&self, p: &mut Pending) {
        if p.fields.is_empty() {
            return;
        }
        p.tick += 1;
        let mut obj = std::mem::take(&mut p.fields);
        obj.insert("actuator".into(), Value::from(self.actuator.0));
        obj.insert("tick".into(), Value::from(p.tick));
        let line = Value::Object(obj).to_string();
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{line}") {
            tracing::debug!(error = %e, "telemetry line dropped");
        }
    }
}

impl TelemetrySink for JsonLinesSink {
    fn publish(&self, name: &str, value: f64) {
        let Ok(mut p) = self.pending.lock() else {
            return;
        };
        if p.fields.contains_key(name) {
            self.emit(&mut p);
        }
        // Non-finite values have no JSON number form
        let v = serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number);
        p.fields.insert(name.to_string(), v);
    }
}
