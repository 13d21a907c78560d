use std::f64::consts::TAU;

use actuator_core::mocks::{MemorySink, RecordingHardware};
use actuator_core::{
    ActuatorController, ActuatorId, ArmFeedforward, ConfigurationError, EncoderConfig,
    EncoderKind, InvariantViolation,
};
use rstest::rstest;

#[rstest]
fn linear_position_without_radius_is_linear_unconfigured() {
    let mut c = ActuatorController::builder(ActuatorId(1))
        .build()
        .expect("simulated controller");
    assert_eq!(c.radius(), None);

    let err = c.linear_position().expect_err("no radius configured");
    match err.downcast_ref::<ConfigurationError>() {
        Some(ConfigurationError::LinearUnconfigured) => {}
        other => panic!("expected LinearUnconfigured, got: {other:?}"),
    }
    let err = c.linear_velocity().expect_err("no radius configured");
    assert!(matches!(
        err.downcast_ref::<ConfigurationError>(),
        Some(ConfigurationError::LinearUnconfigured)
    ));
}

#[rstest]
fn three_motor_revolutions_at_three_to_one_read_as_one_output_revolution() {
    let hw = RecordingHardware::new();
    hw.set_raw_position(12_288.0);
    let mut c = ActuatorController::builder(ActuatorId(1))
        .with_hardware(hw.clone())
        .with_gear_ratio(3.0)
        .with_encoder(EncoderConfig::new(4096, EncoderKind::Quadrature))
        .build()
        .expect("physical controller");

    // 12288 counts = 3 motor revolutions = 1 output revolution at 3:1
    let pos = c.position().expect("position read");
    assert!((pos - TAU).abs() < 1e-12, "got {pos}");

    // One output revolution per second
    hw.set_raw_velocity(12_288.0);
    let vel = c.velocity().expect("velocity read");
    assert!((vel - TAU).abs() < 1e-12, "got {vel}");
}

#[rstest]
#[case(0.05)]
#[case(1.0)]
fn arm_feedforward_on_linear_actuator_is_rejected(#[case] radius: f64) {
    let mut c = ActuatorController::builder(ActuatorId(1))
        .with_radius(radius)
        .build()
        .expect("simulated controller");

    let err = c
        .with_arm_feedforward(ArmFeedforward::new(0.1, 0.5, 1.0, 0.0))
        .expect_err("arm + radius");
    match err.downcast_ref::<InvariantViolation>() {
        Some(InvariantViolation::IncompatibleFeedforward) => {}
        other => panic!("expected IncompatibleFeedforward, got: {other:?}"),
    }
    assert_eq!(c.law_id(), None, "nothing installed on failure");
}

#[rstest]
fn rejected_encoder_config_keeps_previous() {
    let hw = RecordingHardware::new();
    let sink = MemorySink::new();
    let previous = EncoderConfig::new(4096, EncoderKind::Quadrature);
    let mut c = ActuatorController::builder(ActuatorId(1))
        .with_hardware(hw.clone())
        .with_encoder(previous)
        .with_telemetry(sink.clone())
        .build()
        .expect("physical controller");

    hw.set_reject_encoder(true);
    let err = c
        .configure_encoder(EncoderConfig::new(42, EncoderKind::HallEffect))
        .expect_err("device refuses");
    assert!(matches!(err, ConfigurationError::InvalidEncoderConfig(_)));
    assert_eq!(c.encoder_config(), previous);
    assert_eq!(sink.last("encoder_rejected"), Some(1.0));
}

#[rstest]
fn zero_resolution_encoder_is_rejected_without_touching_hardware() {
    let hw = RecordingHardware::new();
    let mut c = ActuatorController::builder(ActuatorId(1))
        .with_hardware(hw.clone())
        .build()
        .expect("physical controller");

    let err = c
        .configure_encoder(EncoderConfig::new(0, EncoderKind::Quadrature))
        .expect_err("cpr 0");
    assert!(matches!(err, ConfigurationError::InvalidEncoderConfig(_)));
    assert!(hw.snapshot().encoders.is_empty());
    assert_eq!(c.encoder_config(), EncoderConfig::default());
}

#[rstest]
fn accepted_encoder_programs_conversion_multipliers() {
    let hw = RecordingHardware::new();
    let mut c = ActuatorController::builder(ActuatorId(1))
        .with_hardware(hw.clone())
        .with_gear_ratio(2.0)
        .build()
        .expect("physical controller");

    c.configure_encoder(EncoderConfig::new(1000, EncoderKind::Quadrature).reversed(true))
        .expect("accepted");
    let rec = hw.snapshot();
    assert_eq!(rec.encoders.len(), 1);
    assert!(rec.encoders[0].reversed);
    let (mv, mp) = rec.multipliers[0];
    let expected = TAU / 2000.0;
    assert!((mv - expected).abs() < 1e-15);
    assert!((mp - expected).abs() < 1e-15);
}

#[rstest]
fn encoder_programming_returns_typed_errors_through_the_result_alias() {
    let mut c = ActuatorController::builder(ActuatorId(1))
        .build()
        .expect("simulated controller");

    let rejected: actuator_core::Result<(), ConfigurationError> =
        c.configure_encoder(EncoderConfig::new(0, EncoderKind::Quadrature));
    assert!(matches!(
        rejected,
        Err(ConfigurationError::InvalidEncoderConfig(_))
    ));

    let accepted: actuator_core::Result<(), ConfigurationError> =
        c.configure_encoder(EncoderConfig::new(2048, EncoderKind::Quadrature));
    assert_eq!(accepted, Ok(()));
    assert!(c.encoder_config().is_configured());

    // The default error parameter stays `Report`
    let moved: actuator_core::Result<()> = c.set_position(1.0);
    assert!(moved.is_ok());
}
