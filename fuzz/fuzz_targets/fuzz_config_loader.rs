#![no_main]
use actuator_core::{ActuatorController, ActuatorId};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parsing and validation must never panic; parse errors are acceptable.
    let Ok(cfg) = actuator_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_err() {
        return;
    }
    // Anything validate() accepts must build a simulated controller.
    let built = ActuatorController::builder(ActuatorId(cfg.actuator.id))
        .with_config(&cfg)
        .build();
    assert!(built.is_ok(), "validated config failed to build: {built:?}");
});
